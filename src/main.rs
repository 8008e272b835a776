use calview::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calview");

    // Load configuration
    let config = startup::load_config().await?;

    // Serve the UI
    startup::start_app(config).await
}
