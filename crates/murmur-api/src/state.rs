//! Application state shared across all handlers.

use std::sync::Arc;

use murmur_auth::{JwtDecoder, MediaTokenIssuer};
use murmur_core::config::AppConfig;
use murmur_database::{DatabasePool, Stores};
use murmur_realtime::{PubSub, RealtimeEngine};
use murmur_service::{CallService, ConversationService, FriendService, MessageService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Real-time engine (presence, subscriptions, READY)
    pub realtime: RealtimeEngine,
    /// Call sessions
    pub calls: CallService,
    /// Friend requests and friendships
    pub friends: FriendService,
    /// Messages and reactions
    pub messages: MessageService,
    /// DMs and groups
    pub conversations: ConversationService,
    /// Postgres pool, absent on the in-memory backend
    pub database: Option<DatabasePool>,
}

impl AppState {
    /// Wire the real-time engine and every service over the given stores
    /// and pub/sub substrate.
    pub fn new(config: AppConfig, stores: Stores, pubsub: Arc<dyn PubSub>) -> Self {
        let decoder = Arc::new(JwtDecoder::new(&config.auth));
        let realtime = RealtimeEngine::new(&config.realtime, decoder, pubsub, &stores);
        let publisher = realtime.publisher.clone();

        let calls = CallService::new(
            stores.calls.clone(),
            stores.users.clone(),
            stores.messages.clone(),
            stores.conversations.clone(),
            publisher.clone(),
            Arc::new(MediaTokenIssuer::new(&config.calls)),
            &config.calls,
        );
        let friends = FriendService::new(stores.social.clone(), stores.users.clone(), publisher.clone());
        let messages = MessageService::new(
            stores.messages.clone(),
            stores.conversations.clone(),
            publisher.clone(),
        );
        let conversations = ConversationService::new(stores.conversations, stores.users, publisher);

        Self {
            config: Arc::new(config),
            realtime,
            calls,
            friends,
            messages,
            conversations,
            database: None,
        }
    }

    /// Report the given pool's health on `/api/health`.
    pub fn with_database(mut self, database: DatabasePool) -> Self {
        self.database = Some(database);
        self
    }
}
