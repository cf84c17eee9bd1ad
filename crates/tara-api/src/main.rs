//! Binary entrypoint for the TARA API server.
use tara_api::{run, TaraConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tara_api=info,tara_core=info,tower_http=debug".into()),
        )
        .init();

    let config = TaraConfig::from_env()?;
    run(config).await
}
