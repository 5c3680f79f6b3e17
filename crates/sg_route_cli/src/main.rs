use anyhow::Result;
use clap::Parser;

mod cli;
mod ui;

fn main() -> Result<()> {
    // A missing .env file is fine; variables may come from the shell.
    dotenvy::dotenv().ok();

    let args = cli::args::Cli::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli::run(args)
}
