mod cli;
mod config;
mod convert;
mod downscale_cmd;
mod grid2d_cmd;
mod grid3d_cmd;
mod inputs;
mod logging;
mod profile_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Grid2d(args) => grid2d_cmd::run(args),
        Command::Grid3d(args) => grid3d_cmd::run(args),
        Command::Profile(args) => profile_cmd::run(args),
        Command::Downscale(args) => downscale_cmd::run(args),
    }
}
