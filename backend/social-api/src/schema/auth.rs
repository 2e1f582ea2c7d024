//! Authentication schema and resolvers

use async_graphql::{Context, Object, Result as GraphQLResult, ResultExt, SimpleObject};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::middleware::create_token;
use crate::models::{NewUser, Role};
use crate::security::{hash_password, verify_password};

/// Signed session token to send back in the session header
#[derive(SimpleObject, Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

#[derive(Debug, Validate)]
struct SignUpInput {
    #[validate(length(min = 1, message = "username cannot be empty"))]
    username: String,
    #[validate(email(message = "email must be a valid address"))]
    email: String,
    #[validate(length(min = 7, max = 42, message = "password must be 7 to 42 characters"))]
    password: String,
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn sign_up(
        &self,
        ctx: &Context<'_>,
        username: String,
        email: String,
        password: String,
    ) -> GraphQLResult<Token> {
        let rc = RequestContext::from_ctx(ctx)?;
        let input = SignUpInput {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password,
        };
        sign_up(rc, input).await.extend()
    }

    /// `login` is either the username or the email
    async fn sign_in(
        &self,
        ctx: &Context<'_>,
        login: String,
        password: String,
    ) -> GraphQLResult<Token> {
        let rc = RequestContext::from_ctx(ctx)?;
        sign_in(rc, login.trim(), &password).await.extend()
    }
}

async fn sign_up(rc: &RequestContext, input: SignUpInput) -> Result<Token> {
    input.validate()?;

    let user = rc
        .state
        .users
        .create_user(NewUser {
            username: input.username,
            email: input.email,
            password_hash: hash_password(&input.password)?,
            role: Role::User,
        })
        .await?;
    info!(user_id = %user.id, "User signed up");

    Ok(Token {
        token: create_token(&user, &rc.state.jwt)?,
    })
}

async fn sign_in(rc: &RequestContext, login: &str, password: &str) -> Result<Token> {
    let user = rc
        .state
        .users
        .find_user_by_login(login)
        .await?
        .ok_or(ApiError::UnknownLogin)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::InvalidPassword);
    }
    info!(user_id = %user.id, "User signed in");

    Ok(Token {
        token: create_token(&user, &rc.state.jwt)?,
    })
}
