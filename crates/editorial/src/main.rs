use std::process;

use editorial::{
    cli::{build_cli, handlers},
    error::exit_code_of,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();

    match handlers::dispatch(&matches) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(exit_code_of(&err));
        }
    }
}
