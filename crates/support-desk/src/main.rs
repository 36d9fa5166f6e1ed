// support-desk/crates/support-desk/src/main.rs

#[cfg(feature = "cli")]
use support_desk::{config::Config, run_server, telemetry};
#[cfg(feature = "cli")]
use dotenvy::dotenv;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = Config::from_env()?;

    run_server(cfg).await
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
