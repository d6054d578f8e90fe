use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{dispatch, error_response, AppState};
use crate::{
    models::users::NewCheckIn,
    services::{users::UserRequest, ServiceError},
};

pub async fn check_in(
    State(state): State<AppState>,
    payload: Result<Json<NewCheckIn>, JsonRejection>,
) -> impl IntoResponse {
    // An unreadable body carries no user id.
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            log::debug!("Rejected check-in body: {}", rejection);
            return error_response(ServiceError::NotAuthenticated);
        }
    };

    let result = dispatch(&state.user_channel, "Users", |response| UserRequest::CheckIn {
        user_id: req.user_id,
        place_id: req.place_id,
        response,
    })
    .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": "Check-in successful!",
                "pointsEarned": outcome.points_earned,
                "rewardGiven": outcome.reward_given,
            })),
        ),
        Err(e) => error_response(e),
    }
}

pub async fn get_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let result = dispatch(&state.user_channel, "Users", |response| UserRequest::GetPoints {
        id: user_id,
        response,
    })
    .await;

    match result {
        Ok(points) => (StatusCode::OK, Json(json!(points))),
        Err(e) => error_response(e),
    }
}
