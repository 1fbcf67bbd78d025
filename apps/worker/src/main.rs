use repricer_worker::config::Config;
use repricer_worker::main_lib::{build_state, init_tracing};
use repricer_worker::scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_format);
    let state = build_state(&config).await?;

    scheduler::start_sweeps(&state)?;
    tracing::info!(
        "Repricer worker {} running, press Ctrl-C to stop",
        state.instance_id
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    state.jobs.stop_all();
    Ok(())
}
