mod args;

pub use args::{
    CliArgs, CommandKind, CompletionsArgs, ConfigArgs, DependencyArgs, InitArgs, OutputFlags,
    SimilarTablesArgs, StatusArgs, TimelineArgs, UpgradeArgs, build_cli,
};

pub fn parse() -> CliArgs {
    args::parse_args()
}
