pub mod handlers;

use bpq_core::HolderId;
use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("bpq")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Capacity-limited blueprint queues with FIFO rotation")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .env("BPQ_DATA_DIR")
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Directory holding config.toml, queues.json and ledger.json"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print output as JSON lines"),
        )
        .subcommand(
            Command::new("learn")
                .about("Give a holder a slot in a blueprint queue")
                .arg(holder_arg())
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("unlearn")
                .about("Remove a holder from a blueprint queue")
                .arg(holder_arg())
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("study")
                .about("Record that a holder studied a blueprint, then admit them")
                .arg(holder_arg())
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("connect")
                .about("Mark a holder online and reconcile their blueprints")
                .arg(holder_arg()),
        )
        .subcommand(
            Command::new("disconnect")
                .about("Mark a holder offline")
                .arg(holder_arg()),
        )
        .subcommand(cmd_queue())
        .subcommand(cmd_config())
        .subcommand(
            Command::new("run")
                .about("Read JSON-lines triggers from stdin and apply them in order"),
        )
}

fn holder_arg() -> Arg {
    Arg::new("holder")
        .required(true)
        .value_parser(|s: &str| s.parse::<HolderId>())
        .help("Holder (player) id")
}

fn key_arg() -> Arg {
    Arg::new("key")
        .required(true)
        .help("Item short name, e.g. rifle.ak")
}

fn cmd_queue() -> Command {
    Command::new("queue")
        .about("Inspect blueprint queues")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List queues, oldest holder first")
                .arg(Arg::new("key").help("Only this item")),
        )
}

fn cmd_config() -> Command {
    Command::new("config")
        .about("Manage configuration")
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Show the effective configuration"))
        .subcommand(
            Command::new("init")
                .about("Write the default configuration")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite an existing config file"),
                ),
        )
}
