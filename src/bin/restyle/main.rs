#![deny(unsafe_code)]

mod cli;

use clap::Parser as _;
use log::LevelFilter;

use restyle::{
    editor::storage::{Storage, DEBUG_MODE_KEY},
    Config, FileStorage, Runner,
};

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let storage = (!args.ephemeral).then(|| args.storage.clone());
    let debug_mode = storage
        .as_ref()
        .and_then(|path| FileStorage::new(path).get(DEBUG_MODE_KEY).ok().flatten())
        .is_some_and(|v| v == "true");
    let level = if debug_mode {
        LevelFilter::Debug
    } else {
        args.verbose.into()
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = Config {
        html: args.html,
        storage,
        output_html: args.output_html,
        command: args.command.into(),
    };

    Runner::new(config).run()?;
    Ok(())
}
