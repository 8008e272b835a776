use crate::config::Config;
use crate::error::{component_error, AppResult};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

// Export components
pub mod google_calendar;

// Re-export Google Calendar handle
pub use google_calendar::GoogleCalendarHandle;

/// Component trait that all components must implement
#[async_trait]
pub trait Component: Send + Sync + Any {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Initialize the component
    async fn init(&self, config: Arc<RwLock<Config>>) -> AppResult<()>;

    /// Shutdown the component
    async fn shutdown(&self) -> AppResult<()>;

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Manager for all components
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_count", &self.components.len())
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
        }
    }

    /// Get the configuration
    #[allow(dead_code)]
    pub fn get_config(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// Register a component
    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Initialize all registered components.
    ///
    /// Every component is attempted; any failure is logged and reported so
    /// the caller can leave the session readiness flag unset.
    pub async fn init_all(&self, config: Arc<RwLock<Config>>) -> AppResult<()> {
        let mut failed = Vec::new();

        for component in &self.components {
            info!("Initializing component: {}", component.name());

            if let Err(e) = component.init(config.clone()).await {
                tracing::error!("Error initializing component {}: {:?}", component.name(), e);
                failed.push(component.name());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(component_error(&format!(
                "Failed to initialize components: {}",
                failed.join(", ")
            )))
        }
    }

    /// Shutdown all components
    pub async fn shutdown_all(&self) -> AppResult<()> {
        info!("Shutting down all components");

        for component in &self.components {
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                // Log error but continue with other components
                tracing::error!(
                    "Error shutting down component {}: {:?}",
                    component.name(),
                    e
                );
            }
        }

        Ok(())
    }

    /// Get a component by name
    pub fn get_component_by_name(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }
}
