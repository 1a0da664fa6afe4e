//! Application state wiring all services together.
//!
//! AppState holds the concrete service instance used by the REST API.
//! `ChatService` is generic over repository/relay/store traits, but AppState
//! pins it to the concrete infra implementations. Handles live for the
//! serving process and are injected here, never referenced as globals.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use studium_core::chat::service::ChatService;
use studium_infra::config::{load_global_config, resolve_data_dir};
use studium_infra::relay::HttpAnsweringRelay;
use studium_infra::sqlite::pool::DatabasePool;
use studium_infra::sqlite::SqliteSessionRepository;
use studium_infra::storage::LocalAttachmentStore;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteSessionRepository, HttpAnsweringRelay, LocalAttachmentStore>;

/// Shared application state holding the wired services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub uploads_dir: PathBuf,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directories exist
        tokio::fs::create_dir_all(&data_dir).await?;
        let uploads_dir = data_dir.join("uploads");
        tokio::fs::create_dir_all(&uploads_dir).await?;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("studium.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_global_config(&data_dir).await;

        // Wire the chat service with its repository, relay, and store
        let session_repo = SqliteSessionRepository::new(db_pool.clone());
        let relay = HttpAnsweringRelay::new(
            config.relay_base_url.clone(),
            Duration::from_secs(config.relay_timeout_secs),
        );
        let attachments = Arc::new(LocalAttachmentStore::new(uploads_dir.clone()));
        let chat_service = ChatService::new(session_repo, relay, attachments);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            uploads_dir,
            data_dir,
            db_pool,
        })
    }
}
