//! msgstore CLI: stats, cleanup, retry and reply over telegram_messages.json. Config from env and optional CLI args.

use anyhow::Result;
use clap::Parser;
use msg_cli::{load_config, run, Cli};
use msg_store::init_tracing;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.data_dir)?;
    init_tracing(config.log_file.as_deref())?;

    let output = run(cli.command, &config)?;
    println!("{}", output);
    Ok(())
}
