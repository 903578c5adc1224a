use std::io;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

mod cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().filter_or("VIGILES_LOG", "warn")).init();

    let cli = cli::Cli::parse();
    let result = cli::run(&cli, &mut io::stdout().lock());
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(cli::exit_status(&result))
}
