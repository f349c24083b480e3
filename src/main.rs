use anyhow::Result;
use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pdfcraft::cli::Cli;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

#[cfg(feature = "pdf")]
fn run(cli: Cli) -> Result<()> {
    pdfcraft::commands::run(&pdfcraft::engine::mupdf::MupdfEngine, cli.command)
}

#[cfg(not(feature = "pdf"))]
fn run(_cli: Cli) -> Result<()> {
    anyhow::bail!("this build has no PDF engine; rebuild with `--features pdf`")
}
