use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{auth::AuthUser, dispatch, error_response, AppState};
use crate::{
    models::places::LocationUpdate,
    services::{notifications::NotificationRequest, ServiceError},
};

pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<LocationUpdate>, JsonRejection>,
) -> impl IntoResponse {
    let coordinates = match payload {
        Ok(Json(location)) => location.latitude.zip(location.longitude),
        Err(rejection) => {
            log::debug!("Rejected location body: {}", rejection);
            None
        }
    };
    let Some((latitude, longitude)) = coordinates else {
        return error_response(ServiceError::Validation(
            "Latitude and longitude are required".to_string(),
        ));
    };

    let result = dispatch(&state.notification_channel, "Notifications", |response| {
        NotificationRequest::UpdateLocation {
            user_id,
            latitude,
            longitude,
            response,
        }
    })
    .await;

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Location processed" })),
        ),
        Err(e) => error_response(e),
    }
}
