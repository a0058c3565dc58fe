mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, ReminderConfig};
pub use repos::{IEventRepo, IUserRepo, Repos};
pub use services::{INotifier, InMemoryNotifier, MailRelayNotifier, SentNotification};
pub use system::{FakeSys, ISys, RealSys};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct PlannerContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifier: Arc<dyn INotifier>,
}

struct ContextParams {
    pub postgres_connection_string: Option<String>,
}

impl PlannerContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let config = Config::new();
        let repos = match params.postgres_connection_string {
            Some(connection_string) => Repos::create_postgres(&connection_string).await?,
            None => {
                warn!("Did not find DATABASE_URL environment variable. Events will only be stored in memory.");
                Repos::create_inmemory()
            }
        };
        let notifier: Arc<dyn INotifier> = match &config.mail_relay_url {
            Some(url) => Arc::new(MailRelayNotifier::new(
                url.clone(),
                config.reminders.sender.clone(),
            )),
            None => {
                warn!("Did not find MAIL_RELAY_URL environment variable. Notifications will only be logged.");
                Arc::new(InMemoryNotifier::new())
            }
        };

        Ok(Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            notifier,
        })
    }

    /// Context backed by inmemory repos and notifier, mostly useful for testing
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            notifier: Arc::new(InMemoryNotifier::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<PlannerContext> {
    PlannerContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> Option<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING).ok()
}
