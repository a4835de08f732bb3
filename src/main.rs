use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

fn init_tracing(verbose: bool) {
    // Logs go to stderr so `image` output on stdout stays clean.
    let filter = if verbose {
        EnvFilter::new("screenshotapi=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    init_tracing(args.verbose);
    cli::run(args).await
}
