//! brickc entry point

use anyhow::Result;
use brickc_cli::commands::{load_config, Cli, CommandExecutor};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let mut executor = CommandExecutor::new(config);
    let result = executor.execute(cli.command).await?;
    println!("{}", result.render(cli.format)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
