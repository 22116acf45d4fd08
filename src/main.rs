use argh::EarlyExit;
use minish::{Config, Shell};
use std::io::IsTerminal;
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("minish");
    let rest: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();

    let config = match Config::from_args(program_name, &rest, std::io::stdin().is_terminal()) {
        Ok(config) => config,
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                print!("{output}");
                process::exit(0);
            }
            Err(()) => {
                eprintln!("{}", output.trim_end());
                process::exit(2);
            }
        },
    };
    tracing::debug!(?config, "starting");

    let mut shell = match Shell::new(&config) {
        Ok(shell) => shell,
        Err(err) => {
            eprintln!("{program_name}: {err}");
            process::exit(1);
        }
    };
    process::exit(shell.run())
}
