// src/bin/cli.rs
use clap::Parser;
use standings_scrape::{cli, log};

fn main() {
    let _ = color_eyre::install();
    let args = cli::Args::parse();
    log::init(args.verbose);
    if let Err(e) = cli::run(args) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
