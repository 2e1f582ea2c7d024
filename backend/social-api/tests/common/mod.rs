//! Shared fixtures: the real schema over the in-memory repository and broker

#![allow(dead_code)]

use async_graphql::{Request, Response, Variables};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use social_api::config::{GraphQLConfig, JwtConfig, PaginationConfig};
use social_api::context::{AppState, Me, RequestContext};
use social_api::db::{InMemoryRepository, PostRepository, UserRepository};
use social_api::models::{NewPost, NewUser, Post, PostText, Role, User};
use social_api::pubsub::BroadcastBroker;
use social_api::schema::{build_schema, AppSchema};
use social_api::security::hash_password;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "password123";

pub struct TestApp {
    pub repo: InMemoryRepository,
    pub broker: Arc<BroadcastBroker>,
    pub state: AppState,
    pub schema: AppSchema,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = InMemoryRepository::new();
        let broker = Arc::new(BroadcastBroker::new(16));
        let state = AppState::new(
            repo.clone(),
            broker.clone(),
            JwtConfig::new(TEST_SECRET),
            PaginationConfig::default(),
        );

        Self {
            repo,
            broker,
            state,
            schema: build_schema(&GraphQLConfig::default()),
        }
    }

    pub async fn create_user(&self, username: &str, role: Role) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    pub async fn create_post_at(&self, user: &User, text: &str, created_at: DateTime<Utc>) -> Post {
        self.repo
            .create_post(NewPost {
                user_id: user.id,
                text: PostText::Plain(text.to_string()),
                created_at,
            })
            .await
            .unwrap()
    }

    pub fn context(&self, user: Option<&User>) -> RequestContext {
        RequestContext::new(self.state.clone(), user.map(me))
    }

    pub async fn execute(&self, query: &str, user: Option<&User>) -> Response {
        self.schema
            .execute(Request::new(query).data(self.context(user)))
            .await
    }

    pub async fn execute_with(
        &self,
        query: &str,
        variables: serde_json::Value,
        user: Option<&User>,
    ) -> Response {
        let request = Request::new(query)
            .variables(Variables::from_json(variables))
            .data(self.context(user));
        self.schema.execute(request).await
    }
}

pub fn me(user: &User) -> Me {
    Me {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        role: user.role,
    }
}

/// Response data as JSON, asserting there were no errors
pub fn data(response: Response) -> serde_json::Value {
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()
}

/// `(message, extensions.code)` of the first error
pub fn first_error(response: &Response) -> (String, String) {
    let error = response.errors.first().expect("expected an error");
    let code = error
        .extensions
        .as_ref()
        .and_then(|extensions| extensions.get("code"))
        .map(|code| match code {
            async_graphql::Value::String(code) => code.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    (error.message.clone(), code)
}
