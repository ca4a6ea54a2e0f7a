use std::sync::Arc;

use clap::Parser;
use sortqtorrent::{init_config, init_logging, log_and_fail, run};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {}

#[tokio::main]
async fn main() {
    init_logging(".", "sortqtorrent.log").map_err(|e| log_and_fail(e, 1)).unwrap();
    stable_eyre::install().map_err(|e| log_and_fail(e, 1)).unwrap();
    info!("starting category sync");

    let _args = Args::parse();
    let cfg = init_config("config/settings", "SQT")
        .map_err(|e| log_and_fail(e, 1)).unwrap();
    run(Arc::new(cfg)).await.map_err(|e| log_and_fail(e, 1)).unwrap();

    info!("category sync completed succesfully!");
}
