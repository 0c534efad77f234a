use staticd::config::{AppState, CliOverrides, Config};
use staticd::{logger, server};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let overrides = CliOverrides::parse(std::env::args().skip(1))?;
    let cfg = Config::load(&overrides)?;
    logger::init(&cfg)?;

    // Multi-thread runtime, worker count from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let state = Arc::new(AppState::new(cfg)?);
    runtime.block_on(server::start(state))
}
