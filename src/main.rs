// src/main.rs

use testrelay::errors::RelayError;
use testrelay::{cli, logging, run};

/// Conventional exit status for a SIGINT-terminated run.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) if matches!(err.downcast_ref::<RelayError>(), Some(RelayError::Interrupted)) => {
            eprintln!("testrelay: interrupted");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        Err(err) => {
            eprintln!("testrelay error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
