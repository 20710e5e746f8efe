use std::path::PathBuf;

use anyhow::{bail, Result};
use bpq_core::{HolderId, ResourceKey};
use clap::ArgMatches;

use crate::{
    commands::{
        self,
        queue::{QueueAction, QueueOptions},
        Output,
    },
    state::DataDir,
};

pub async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let data = DataDir::resolve(matches.get_one::<PathBuf>("data-dir").map(PathBuf::as_path))?;
    let output = Output::new(matches.get_flag("json"));
    tracing::debug!(data_dir = %data.root().display(), "Using data directory");

    match matches.subcommand() {
        Some(("learn", sub_m)) => commands::queue::run(&queue_options(QueueAction::Learn, sub_m)?, &data, output),
        Some(("unlearn", sub_m)) => commands::queue::run(&queue_options(QueueAction::Unlearn, sub_m)?, &data, output),
        Some(("study", sub_m)) => commands::queue::run(&queue_options(QueueAction::Study, sub_m)?, &data, output),
        Some(("connect", sub_m)) => commands::session::connect(holder(sub_m)?, &data, output),
        Some(("disconnect", sub_m)) => commands::session::disconnect(holder(sub_m)?, &data, output),
        Some(("queue", sub_m)) => handle_queue(sub_m, &data, output),
        Some(("config", sub_m)) => handle_config(sub_m, &data, output),
        Some(("run", _)) => commands::run::run(&data, output).await.map(|_| ()),
        _ => bail!("Unknown command. Run 'bpq --help' for usage."),
    }
}

fn handle_queue(matches: &ArgMatches, data: &DataDir, output: Output) -> Result<()> {
    match matches.subcommand() {
        Some(("list", sub_m)) => {
            let key = sub_m.get_one::<String>("key").map(|k| ResourceKey::new(k.as_str()));
            commands::queue::list(key.as_ref(), data, output)
        }
        _ => bail!("Unknown queue subcommand. Run 'bpq queue --help' for usage."),
    }
}

fn handle_config(matches: &ArgMatches, data: &DataDir, output: Output) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => commands::config::show(data, output),
        Some(("init", sub_m)) => commands::config::init(data, sub_m.get_flag("force"), output),
        _ => bail!("Unknown config subcommand. Run 'bpq config --help' for usage."),
    }
}

fn holder(matches: &ArgMatches) -> Result<HolderId> {
    matches
        .get_one::<HolderId>("holder")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Holder id required"))
}

fn queue_options(action: QueueAction, matches: &ArgMatches) -> Result<QueueOptions> {
    let key = matches
        .get_one::<String>("key")
        .ok_or_else(|| anyhow::anyhow!("Item short name required"))?;
    Ok(QueueOptions {
        action,
        holder: holder(matches)?,
        key: ResourceKey::new(key.as_str()),
    })
}
