pub mod extract;
pub mod rest;
pub mod state;
pub mod thoughts;
pub mod users;

use crate::config::ConfigError;
use crate::error::ApiError;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application: user and thought routes, CORS, request
/// tracing and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let user_routes = Router::new()
        .route(
            "/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/users/{user_id}",
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/users/{user_id}/friends/{friend_id}",
            post(users::add_friend_handler).delete(users::remove_friend_handler),
        );

    // Every thought route names its first segment `{id}`; on the delete route
    // that segment is the owning user's id.
    let thought_routes = Router::new()
        .route(
            "/thoughts",
            get(thoughts::list_thoughts_handler).post(thoughts::create_thought_handler),
        )
        .route(
            "/thoughts/{id}",
            get(thoughts::get_thought_handler).put(thoughts::update_thought_handler),
        )
        .route(
            "/thoughts/{id}/{thought_id}",
            delete(thoughts::delete_thought_handler),
        )
        .route(
            "/thoughts/{id}/reactions",
            post(thoughts::add_reaction_handler),
        )
        .route(
            "/thoughts/{id}/reactions/{reaction_id}",
            delete(thoughts::remove_reaction_handler),
        );

    let api_router = Router::new()
        .merge(user_routes)
        .merge(thought_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
