// src/main.rs

use provisioner::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("provisioner error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    // Nothing may run with a broken configuration, so this fails before
    // logging is even set up.
    let cfg = config::load_and_validate(&args.config)?;
    logging::init_logging(args.log_level, cfg.config.log_path.as_deref())?;
    run(args, cfg).await
}
