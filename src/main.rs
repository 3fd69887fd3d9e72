// src/main.rs

use stagehand::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("stagehand: failed to initialise logging: {err:?}");
        std::process::exit(1);
    }

    match stagehand::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("stagehand error: {err:?}");
            std::process::exit(1);
        }
    }
}
