use chat_rooms::config::ChatConfig;
use chat_rooms::lifecycle::{setup_tracing, ChatSystem};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config = ChatConfig::from_env()?;
    info!(?config, "Starting chat server");

    let span = tracing::info_span!("startup", building = %config.building);
    let system = ChatSystem::start(config).instrument(span).await?;

    if let Err(e) = system.serve().await {
        error!(error = %e, "Server failed");
        system.shutdown().await;
        return Err(e.into());
    }

    system.shutdown().await;
    info!("Chat server stopped");
    Ok(())
}
