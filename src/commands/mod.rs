mod common;
mod completions;
mod config;
mod dependency;
mod help;
mod init;
mod similar_tables;
mod status;
mod timeline;
mod upgrade;

use anyhow::Result;

use crate::cli::{CliArgs, CommandKind};

pub fn dispatch(args: &CliArgs) -> Result<()> {
    match &args.command {
        CommandKind::Help { all, command } => help::run(*all, command.as_deref()),
        CommandKind::Status(cmd) => status::run(args, cmd),
        CommandKind::Dependency(cmd) => dependency::run(args, cmd),
        CommandKind::SimilarTables(cmd) => similar_tables::run(args, cmd),
        CommandKind::Timeline(cmd) => timeline::run(args, cmd),
        CommandKind::Upgrade(cmd) => upgrade::run(args, cmd),
        CommandKind::Init(cmd) => init::run(args, cmd),
        CommandKind::Config(_) => config::run(args),
        CommandKind::Completions(cmd) => completions::run(args, cmd),
    }
}
