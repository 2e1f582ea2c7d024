//! JWT session middleware
//!
//! Reads the session token header, verifies it with the shared secret and
//! stores the outcome as an [`Authentication`] request extension. The
//! middleware never short-circuits: a missing header is an anonymous
//! request, and an invalid token is reported by the GraphQL handler.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::context::Me;
use crate::models::{Role, User};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // Subject (user ID)
    pub exp: usize,       // Expiration time
    pub iat: usize,       // Issued at
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl Claims {
    pub fn to_me(&self) -> Option<Me> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        Some(Me {
            id,
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
        })
    }
}

/// Outcome of session token verification for one request
#[derive(Debug, Clone)]
pub enum Authentication {
    Anonymous,
    Verified(Me),
    Rejected(String),
}

/// Sign a session token for `user`
pub fn create_token(user: &User, config: &JwtConfig) -> crate::error::Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        exp: now + config.expiry_seconds as usize,
        iat: now,
        email: user.email.clone(),
        username: user.username.clone(),
        role: user.role,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify signature and expiry of a session token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, String> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

/// Resolve the session carried by `header_value`. Only a missing header
/// is anonymous; a blank one is rejected.
pub fn authenticate(header_value: Option<&str>, config: &JwtConfig) -> Authentication {
    let token = match header_value.map(str::trim) {
        None => return Authentication::Anonymous,
        Some("") => return Authentication::Rejected("Empty session token".to_string()),
        Some(token) => token,
    };

    match verify_token(token, config) {
        Ok(claims) => match claims.to_me() {
            Some(me) => Authentication::Verified(me),
            None => Authentication::Rejected("Invalid token subject".to_string()),
        },
        Err(reason) => Authentication::Rejected(reason),
    }
}

/// JWT session middleware
pub struct JwtMiddleware {
    config: Arc<JwtConfig>,
}

impl JwtMiddleware {
    pub fn new(config: Arc<JwtConfig>) -> Self {
        Self { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService {
            service,
            config: self.config.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: S,
    config: Arc<JwtConfig>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authentication = match req.headers().get(self.config.header_name.as_str()) {
            None => Authentication::Anonymous,
            Some(value) => match value.to_str() {
                Ok(token) => authenticate(Some(token), &self.config),
                Err(_) => Authentication::Rejected("Invalid session header encoding".to_string()),
            },
        };
        if let Authentication::Rejected(reason) = &authentication {
            debug!(path = %req.path(), reason = %reason, "Session token rejected");
        }
        req.extensions_mut().insert(authentication);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}
