//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = swellcheck_cli::run() {
        if let swellcheck_cli::CliError::ArgumentParsing(clap_err) = &err {
            clap_err.exit();
        }
        eprintln!("swellcheck: {err}");
        std::process::exit(1);
    }
}
