//! HTTP handlers and route table

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql::{Data, ErrorExtensions, Pos};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};

use crate::context::{AppState, RequestContext};
use crate::error::ApiError;
use crate::middleware::Authentication;
use crate::schema::AppSchema;

/// Execute a query or mutation with the session resolved by `JwtMiddleware`
pub async fn graphql_handler(
    schema: web::Data<AppSchema>,
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let authentication = http_req
        .extensions()
        .get::<Authentication>()
        .cloned()
        .unwrap_or(Authentication::Anonymous);

    let me = match authentication {
        Authentication::Anonymous => None,
        Authentication::Verified(me) => Some(me),
        Authentication::Rejected(_) => {
            let error = ApiError::SessionExpired.extend().into_server_error(Pos::default());
            return async_graphql::Response::from_errors(vec![error]).into();
        }
    };

    let request = req
        .into_inner()
        .data(RequestContext::new(state.get_ref().clone(), me));
    schema.execute(request).await.into()
}

/// Session data for a new WebSocket connection. Connections are anonymous.
pub async fn init_connection(
    state: AppState,
    _payload: serde_json::Value,
) -> async_graphql::Result<Data> {
    let mut data = Data::default();
    data.insert(RequestContext::for_connection(state));
    Ok(data)
}

/// WebSocket subscriptions (`graphql-transport-ws` and `graphql-ws`)
pub async fn graphql_subscription_handler(
    schema: web::Data<AppSchema>,
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let state = state.get_ref().clone();

    GraphQLSubscription::new(schema.get_ref().clone())
        .on_connection_init(move |payload| init_connection(state, payload))
        .start(&req, payload)
}

pub async fn health_handler() -> &'static str {
    "ok"
}

/// SDL (Schema Definition Language) endpoint
pub async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

pub async fn playground_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/ws")
                .finish(),
        )
}

/// Register every route; `/playground` only when `playground` is set
pub fn configure_routes(cfg: &mut web::ServiceConfig, playground: bool) {
    cfg.route("/graphql", web::post().to(graphql_handler))
        .route("/graphql", web::get().to(graphql_subscription_handler))
        .route("/ws", web::get().to(graphql_subscription_handler))
        .route("/schema", web::get().to(schema_handler))
        .route("/health", web::get().to(health_handler));

    if playground {
        cfg.route("/playground", web::get().to(playground_handler));
    }
}
