mod app;
mod cli;
mod db;
mod http;
mod paths;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);
    app::run(cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = colog::default_builder();
    builder.filter(None, level);
    builder.init();
}
