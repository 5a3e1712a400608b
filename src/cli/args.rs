use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};

#[derive(Debug, Clone)]
pub struct OutputFlags {
    pub json: bool,
    pub markdown: bool,
    pub pretty: bool,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
    pub allow_write: bool,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
    pub output: OutputFlags,
    pub verbose: u8,
    pub quiet: bool,
    pub command: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Help { all: bool, command: Option<String> },
    Status(StatusArgs),
    Dependency(DependencyArgs),
    SimilarTables(SimilarTablesArgs),
    Timeline(TimelineArgs),
    Upgrade(UpgradeArgs),
    Init(InitArgs),
    Config(ConfigArgs),
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyArgs {
    pub objects: Vec<String>,
    pub schema: Option<String>,
    pub parents: bool,
    pub include_system: bool,
    pub include_self: bool,
    pub no_script: bool,
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarTablesArgs {
    pub table: Option<String>,
    pub schema: Option<String>,
    pub include_views: bool,
    pub match_percent: Option<u64>,
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineArgs {
    pub source: Option<String>,
    pub database: Option<String>,
    pub since: Option<u64>,
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeArgs {
    pub databases: Vec<String>,
    pub no_checkdb: bool,
    pub no_update_usage: bool,
    pub no_update_stats: bool,
    pub no_refresh_views: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
    pub force: bool,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsArgs {
    pub shell: Option<String>,
}

pub fn build_cli(show_all: bool) -> Command {
    let mut cmd = Command::new("dbakit")
        .about("SQL Server DBA toolkit for dependency analysis and maintenance")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .subcommand_value_name("COMMAND");

    cmd = add_global_args(cmd);

    cmd = cmd.subcommand(command_help());

    cmd = cmd.subcommand(command_dependency(show_all));
    cmd = cmd.subcommand(command_similar_tables(show_all));
    cmd = cmd.subcommand(command_timeline(show_all));
    cmd = cmd.subcommand(command_upgrade(show_all));
    cmd = cmd.subcommand(command_status(show_all));
    cmd = cmd.subcommand(command_init(show_all));
    cmd = cmd.subcommand(command_config(show_all));

    cmd = cmd.subcommand(command_completions(show_all));

    cmd
}

pub fn parse_args() -> CliArgs {
    let matches = build_cli(false).get_matches();
    parse_matches(&matches)
}

fn add_global_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Override config file location"),
    )
    .arg(
        Arg::new("env-file")
            .long("env-file")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Load environment variables from file (default: .env)"),
    )
    .arg(
        Arg::new("profile")
            .long("profile")
            .value_name("NAME")
            .global(true)
            .help("Select connection profile"),
    )
    .arg(
        Arg::new("server")
            .long("server")
            .value_name("HOST")
            .global(true)
            .help("SQL Server hostname"),
    )
    .arg(
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .value_parser(clap::value_parser!(u16))
            .global(true)
            .help("SQL Server port (default: 1433)"),
    )
    .arg(
        Arg::new("database")
            .long("database")
            .value_name("NAME")
            .global(true)
            .help("Database name (default: master)"),
    )
    .arg(
        Arg::new("user")
            .long("user")
            .value_name("USER")
            .global(true)
            .help("SQL Server username"),
    )
    .arg(
        Arg::new("password")
            .long("password")
            .value_name("PASS")
            .global(true)
            .help("SQL Server password"),
    )
    .arg(
        Arg::new("timeout")
            .long("timeout")
            .value_name("MS")
            .value_parser(clap::value_parser!(u64))
            .global(true)
            .help("Connection timeout in milliseconds"),
    )
    .arg(
        Arg::new("allow-write")
            .long("allow-write")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Allow write operations (dangerous; applies to the upgrade command only)"),
    )
    .arg(
        Arg::new("encrypt")
            .long("encrypt")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Enable connection encryption"),
    )
    .arg(
        Arg::new("trust-cert")
            .long("trust-cert")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Trust server certificate"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Output as JSON"),
    )
    .arg(
        Arg::new("markdown")
            .long("markdown")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force markdown table output"),
    )
    .arg(
        Arg::new("pretty")
            .long("pretty")
            .long("pretty-print")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force pretty-printed table output"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true)
            .help("Enable debug logging"),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Suppress non-error output"),
    )
}

fn command_help() -> Command {
    Command::new("help")
        .about("Show help for commands")
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Show all commands, including advanced ones"),
        )
        .arg(Arg::new("command").value_name("COMMAND"))
}

fn command_core(
    name: &'static str,
    about: &'static str,
    aliases: &'static [&'static str],
    _show_all: bool,
) -> Command {
    let mut cmd = Command::new(name).about(about);
    for alias in aliases {
        cmd = cmd.visible_alias(*alias);
    }
    cmd
}

fn command_advanced(
    name: &'static str,
    about: &'static str,
    aliases: &'static [&'static str],
    show_all: bool,
) -> Command {
    let mut cmd = Command::new(name).about(about);
    for alias in aliases {
        cmd = cmd.visible_alias(*alias);
    }
    if !show_all {
        cmd = cmd.hide(true);
    }
    cmd
}

fn command_dependency(show_all: bool) -> Command {
    command_core(
        "dependency",
        "Resolve object dependencies in safe apply order",
        &["deps", "dep"],
        show_all,
    )
    .arg(
        Arg::new("object")
            .index(1)
            .value_name("OBJECT")
            .num_args(1..)
            .help("Object to resolve, optionally schema-qualified; repeatable"),
    )
    .arg(Arg::new("schema").long("schema").value_name("name"))
    .arg(
        Arg::new("parents")
            .long("parents")
            .action(ArgAction::SetTrue)
            .help("Resolve what the object depends on instead of its dependents"),
    )
    .arg(
        Arg::new("include-system")
            .long("include-system")
            .action(ArgAction::SetTrue)
            .help("Include system objects in the graph"),
    )
    .arg(
        Arg::new("include-self")
            .long("include-self")
            .action(ArgAction::SetTrue)
            .help("Keep the root object in the output"),
    )
    .arg(
        Arg::new("no-script")
            .long("no-script")
            .action(ArgAction::SetTrue)
            .help("Skip creation-script generation"),
    )
    .arg(
        Arg::new("csv")
            .long("csv")
            .value_name("file")
            .value_hint(ValueHint::FilePath),
    )
}

fn command_similar_tables(show_all: bool) -> Command {
    command_core(
        "similar-tables",
        "Find tables with matching column sets",
        &["similar"],
        show_all,
    )
    .arg(Arg::new("table").long("table").value_name("name"))
    .arg(Arg::new("schema").long("schema").value_name("name"))
    .arg(
        Arg::new("include-views")
            .long("include-views")
            .action(ArgAction::SetTrue)
            .help("Compare views as well as tables"),
    )
    .arg(
        Arg::new("match-percent")
            .long("match-percent")
            .value_name("pct")
            .value_parser(clap::value_parser!(u64))
            .help("Only report candidates at or above this column-match percentage"),
    )
    .arg(
        Arg::new("csv")
            .long("csv")
            .value_name("file")
            .value_hint(ValueHint::FilePath),
    )
}

fn command_timeline(show_all: bool) -> Command {
    command_core(
        "timeline",
        "HTML timeline report of job or backup history",
        &[],
        show_all,
    )
    .arg(
        Arg::new("source")
            .long("source")
            .value_name("kind")
            .value_parser(["jobs", "backups"])
            .help("Event source: agent job history or backup history"),
    )
    .arg(
        Arg::new("database")
            .long("database")
            .value_name("name")
            .help("Filter events to one database"),
    )
    .arg(
        Arg::new("since")
            .long("since")
            .value_name("days")
            .value_parser(clap::value_parser!(u64))
            .help("Event window in days (default: 30)"),
    )
    .arg(
        Arg::new("out")
            .long("out")
            .value_name("file")
            .value_hint(ValueHint::FilePath)
            .help("Write the HTML report to a file instead of stdout"),
    )
}

fn command_upgrade(show_all: bool) -> Command {
    command_core(
        "upgrade",
        "Run the post-upgrade maintenance sequence against a database",
        &[],
        show_all,
    )
    .arg(
        Arg::new("database")
            .long("database")
            .value_name("name")
            .action(ArgAction::Append)
            .help("Target database; repeatable"),
    )
    .arg(
        Arg::new("no-checkdb")
            .long("no-checkdb")
            .action(ArgAction::SetTrue)
            .help("Skip DBCC CHECKDB"),
    )
    .arg(
        Arg::new("no-update-usage")
            .long("no-update-usage")
            .action(ArgAction::SetTrue)
            .help("Skip DBCC UPDATEUSAGE"),
    )
    .arg(
        Arg::new("no-update-stats")
            .long("no-update-stats")
            .action(ArgAction::SetTrue)
            .help("Skip sp_updatestats"),
    )
    .arg(
        Arg::new("no-refresh-views")
            .long("no-refresh-views")
            .action(ArgAction::SetTrue)
            .help("Skip sp_refreshview for the database's views"),
    )
    .arg(
        Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Print the planned statements without executing them"),
    )
}

fn command_status(show_all: bool) -> Command {
    command_core(
        "status",
        "Connectivity smoke test",
        &["db-status"],
        show_all,
    )
}

fn command_init(show_all: bool) -> Command {
    command_core("init", "Create config file", &[], show_all)
        .arg(
            Arg::new("path")
                .long("path")
                .value_name("path")
                .value_hint(ValueHint::FilePath),
        )
        .arg(Arg::new("force").long("force").action(ArgAction::SetTrue))
        .arg(Arg::new("profile").long("profile").value_name("name"))
}

fn command_config(show_all: bool) -> Command {
    command_core("config", "Display resolved config", &[], show_all)
}

fn command_completions(show_all: bool) -> Command {
    command_advanced("completions", "Generate shell completions", &[], show_all).arg(
        Arg::new("shell")
            .long("shell")
            .value_name("name")
            .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
    )
}

fn parse_matches(matches: &ArgMatches) -> CliArgs {
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let env_file = matches.get_one::<String>("env-file").map(PathBuf::from);
    let profile = matches.get_one::<String>("profile").cloned();
    let server = matches.get_one::<String>("server").cloned();
    let port = matches.get_one::<u16>("port").copied();
    let database = matches.get_one::<String>("database").cloned();
    let user = matches.get_one::<String>("user").cloned();
    let password = matches.get_one::<String>("password").cloned();
    let timeout_ms = matches.get_one::<u64>("timeout").copied();
    let allow_write = matches.get_flag("allow-write");
    let encrypt = matches.get_one::<bool>("encrypt").copied();
    let trust_cert = matches.get_one::<bool>("trust-cert").copied();
    let output = OutputFlags {
        json: matches.get_flag("json"),
        markdown: matches.get_flag("markdown"),
        pretty: matches.get_flag("pretty"),
    };
    let verbose = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");

    let command = match matches.subcommand() {
        Some(("help", sub_m)) => CommandKind::Help {
            all: sub_m.get_flag("all"),
            command: sub_m.get_one::<String>("command").cloned(),
        },
        Some(("status", _)) => CommandKind::Status(StatusArgs),
        Some(("dependency", sub_m)) => CommandKind::Dependency(DependencyArgs {
            objects: sub_m
                .get_many::<String>("object")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            schema: sub_m.get_one::<String>("schema").cloned(),
            parents: sub_m.get_flag("parents"),
            include_system: sub_m.get_flag("include-system"),
            include_self: sub_m.get_flag("include-self"),
            no_script: sub_m.get_flag("no-script"),
            csv: sub_m.get_one::<String>("csv").map(PathBuf::from),
        }),
        Some(("similar-tables", sub_m)) => CommandKind::SimilarTables(SimilarTablesArgs {
            table: sub_m.get_one::<String>("table").cloned(),
            schema: sub_m.get_one::<String>("schema").cloned(),
            include_views: sub_m.get_flag("include-views"),
            match_percent: sub_m.get_one::<u64>("match-percent").copied(),
            csv: sub_m.get_one::<String>("csv").map(PathBuf::from),
        }),
        Some(("timeline", sub_m)) => CommandKind::Timeline(TimelineArgs {
            source: sub_m.get_one::<String>("source").cloned(),
            database: sub_m.get_one::<String>("database").cloned(),
            since: sub_m.get_one::<u64>("since").copied(),
            out: sub_m.get_one::<String>("out").map(PathBuf::from),
        }),
        Some(("upgrade", sub_m)) => CommandKind::Upgrade(UpgradeArgs {
            databases: sub_m
                .get_many::<String>("database")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            no_checkdb: sub_m.get_flag("no-checkdb"),
            no_update_usage: sub_m.get_flag("no-update-usage"),
            no_update_stats: sub_m.get_flag("no-update-stats"),
            no_refresh_views: sub_m.get_flag("no-refresh-views"),
            dry_run: sub_m.get_flag("dry-run"),
        }),
        Some(("init", sub_m)) => CommandKind::Init(InitArgs {
            path: sub_m.get_one::<String>("path").map(PathBuf::from),
            force: sub_m.get_flag("force"),
            profile: sub_m.get_one::<String>("profile").cloned(),
        }),
        Some(("config", _)) => CommandKind::Config(ConfigArgs),
        Some(("completions", sub_m)) => CommandKind::Completions(CompletionsArgs {
            shell: sub_m.get_one::<String>("shell").cloned(),
        }),
        _ => CommandKind::Help {
            all: false,
            command: None,
        },
    };

    CliArgs {
        config_path,
        env_file,
        profile,
        server,
        port,
        database,
        user,
        password,
        timeout_ms,
        allow_write,
        encrypt,
        trust_cert,
        output,
        verbose,
        quiet,
        command,
    }
}
