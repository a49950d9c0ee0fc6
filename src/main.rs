// src/main.rs

use acsbuild::types::RunStatus;
use acsbuild::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(RunStatus::Error) => std::process::exit(2),
        Ok(_) => {}
        Err(err) => {
            eprintln!("acsbuild error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<RunStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
