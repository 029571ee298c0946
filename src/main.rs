mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries only command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run_init(args)?,
        Commands::Whoami => commands::whoami::run_whoami()?,
        Commands::Keyring(command) => commands::keyring::run_keyring(command)?,
        Commands::Encrypt(args) => commands::encrypt::run_encrypt(args)?,
        Commands::Decrypt(args) => commands::decrypt::run_decrypt(args)?,
        Commands::Inspect(args) => commands::inspect::run_inspect(args)?,
    }

    Ok(())
}
