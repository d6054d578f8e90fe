use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::DecodingKey;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    notifications::NotificationRequest, places::PlaceRequest, users::UserRequest, ServiceError,
};

mod auth;
mod notifications;
mod places;
mod users;

#[derive(Clone)]
pub struct AppState {
    user_channel: mpsc::Sender<UserRequest>,
    place_channel: mpsc::Sender<PlaceRequest>,
    notification_channel: mpsc::Sender<NotificationRequest>,
    jwt_key: DecodingKey,
}

impl AppState {
    pub fn new(
        user_channel: mpsc::Sender<UserRequest>,
        place_channel: mpsc::Sender<PlaceRequest>,
        notification_channel: mpsc::Sender<NotificationRequest>,
        jwt_secret: &str,
    ) -> Self {
        Self {
            user_channel,
            place_channel,
            notification_channel,
            jwt_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

type ErrorResponse = (StatusCode, Json<Value>);

fn error_response(error: ServiceError) -> ErrorResponse {
    let status = match &error {
        ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::Validation(_) | ServiceError::CooldownActive => StatusCode::BAD_REQUEST,
        ServiceError::UserNotFound | ServiceError::PlaceNotFound => StatusCode::NOT_FOUND,
        ServiceError::Repository(..)
        | ServiceError::Communication(..)
        | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {}", error);
        return (status, Json(json!({ "message": "Server error" })));
    }

    (status, Json(json!({ "message": error.to_string() })))
}

/// Sends a request to a service and waits for its answer.
async fn dispatch<R, T>(
    channel: &mpsc::Sender<R>,
    service: &str,
    build: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> R,
) -> Result<T, ServiceError> {
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(build(response_tx))
        .await
        .map_err(|e| ServiceError::Communication(format!("HTTP => {}", service), e.to_string()))?;

    response_rx
        .await
        .map_err(|e| ServiceError::Communication(format!("{} => HTTP", service), e.to_string()))?
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/check-in", post(users::check_in))
        .route("/api/users/{user_id}", get(users::get_points))
        .route(
            "/api/places",
            get(places::list_places).post(places::create_place),
        )
        .route("/api/places/{id}", get(places::get_place))
        .route("/api/places/{id}/reviews", post(places::add_review))
        .route(
            "/api/notifications/update-location",
            post(notifications::update_location),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
