//! Shared application state and the per-request GraphQL context

use async_graphql::dataloader::{DataLoader, HashMapCache};
use async_graphql::{Context, ErrorExtensions};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{JwtConfig, PaginationConfig};
use crate::db::{MessageRepository, PostRepository, UserRepository};
use crate::error::ApiError;
use crate::models::Role;
use crate::pubsub::EventBroker;
use crate::schema::loaders::UserLoader;

/// Identity of the caller, taken from a verified session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Me {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl Me {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Long-lived services shared by every request
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub broker: Arc<dyn EventBroker>,
    pub jwt: Arc<JwtConfig>,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Back every repository trait with the same store
    pub fn new<R>(
        repository: R,
        broker: Arc<dyn EventBroker>,
        jwt: JwtConfig,
        pagination: PaginationConfig,
    ) -> Self
    where
        R: UserRepository + PostRepository + MessageRepository + 'static,
    {
        let repository = Arc::new(repository);
        Self {
            users: repository.clone(),
            posts: repository.clone(),
            messages: repository,
            broker,
            jwt: Arc::new(jwt),
            pagination,
        }
    }
}

/// Context attached to a single GraphQL request or WebSocket connection.
///
/// The user loader lives here so its cache never outlives the request. A
/// connection serves many subscription events, so its loader only batches.
pub struct RequestContext {
    pub state: AppState,
    pub me: Option<Me>,
    pub user_loader: DataLoader<UserLoader, HashMapCache>,
}

impl RequestContext {
    pub fn new(state: AppState, me: Option<Me>) -> Self {
        let user_loader = DataLoader::with_cache(
            UserLoader::new(state.users.clone()),
            tokio::spawn,
            HashMapCache::default(),
        );

        Self {
            state,
            me,
            user_loader,
        }
    }

    pub fn anonymous(state: AppState) -> Self {
        Self::new(state, None)
    }

    /// Context shared by every event of one WebSocket connection
    pub fn for_connection(state: AppState) -> Self {
        let rc = Self::anonymous(state);
        rc.user_loader.enable_all_cache(false);
        rc
    }

    pub fn from_ctx<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a RequestContext> {
        ctx.data::<RequestContext>().map_err(|_| {
            ApiError::Internal("request context not attached".to_string()).extend()
        })
    }
}
