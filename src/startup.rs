use crate::components::{google_calendar::GoogleCalendar, ComponentManager};
use crate::config::Config;
use crate::error::Error;
use crate::session::Session;
use crate::shutdown;
use crate::web::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize components and serve the web interface until shutdown
pub async fn start_app(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let session = Arc::new(RwLock::new(Session::new()));

    // Register enabled components
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    {
        let config_read = config.read().await;
        if config_read.is_component_enabled("google_calendar") {
            component_manager.register(GoogleCalendar::new());
        }
    }
    let component_manager = Arc::new(component_manager);

    // A failed init leaves the session uninitialized and sign-in inert
    match component_manager.init_all(Arc::clone(&config)).await {
        Ok(()) => session.write().await.mark_initialized(),
        Err(e) => error!("Failed to initialize components: {:?}", e),
    }

    let state = AppState::new(
        Arc::clone(&config),
        Arc::clone(&component_manager),
        session,
    );
    let app = web::build_router(state);

    let (port, open_browser) = {
        let config_read = config.read().await;
        (config_read.port, config_read.open_browser)
    };

    // Bind to address and run server
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::from)?;
    info!("Listening on {}", addr);

    // Open the UI in the default browser, best effort
    if open_browser {
        let url = format!("http://localhost:{}/", port);
        if let Err(e) = webbrowser::open(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    // Create shutdown channel and spawn the signal handler task
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_recv.await;
        })
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}
