//! GraphQL schema: posts, messages, users and their subscriptions

pub mod auth;
pub mod loaders;
pub mod message;
pub mod pagination;
pub mod post;
pub mod scalars;
pub mod subscription;
pub mod user;

use async_graphql::extensions::Tracing;
use async_graphql::{MergedObject, Schema, ID};
use uuid::Uuid;

use crate::config::GraphQLConfig;
use crate::error::{ApiError, Result};

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(post::PostQuery, message::MessageQuery, user::UserQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(
    post::PostMutation,
    message::MessageMutation,
    user::UserMutation,
    auth::AuthMutation,
);

/// GraphQL App Schema type with WebSocket subscriptions
pub type AppSchema = Schema<QueryRoot, MutationRoot, subscription::SubscriptionRoot>;

/// Build the schema. Services are not stored in it; each request carries a
/// [`RequestContext`](crate::context::RequestContext).
pub fn build_schema(config: &GraphQLConfig) -> AppSchema {
    let mut builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        subscription::SubscriptionRoot::default(),
    )
    .limit_depth(config.max_depth)
    .limit_complexity(config.max_complexity)
    .extension(Tracing);

    if !config.introspection {
        builder = builder.disable_introspection();
    }

    builder.finish()
}

/// Parse a GraphQL `ID` into a row id
pub(crate) fn parse_id(id: &ID) -> Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| ApiError::validation(format!("Invalid id: {}", id.as_str())))
}
