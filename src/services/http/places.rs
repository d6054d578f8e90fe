use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{dispatch, error_response, AppState};
use crate::{
    models::places::{NewPlace, NewReview},
    services::places::PlaceRequest,
};

pub async fn list_places(State(state): State<AppState>) -> impl IntoResponse {
    let result = dispatch(&state.place_channel, "Places", |response| {
        PlaceRequest::ListPlaces { response }
    })
    .await;

    match result {
        Ok(places) => (StatusCode::OK, Json(json!(places))),
        Err(e) => error_response(e),
    }
}

pub async fn get_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = dispatch(&state.place_channel, "Places", |response| {
        PlaceRequest::GetPlace { id, response }
    })
    .await;

    match result {
        Ok(place) => (StatusCode::OK, Json(json!(place))),
        Err(e) => error_response(e),
    }
}

pub async fn create_place(
    State(state): State<AppState>,
    Json(place): Json<NewPlace>,
) -> impl IntoResponse {
    let result = dispatch(&state.place_channel, "Places", |response| {
        PlaceRequest::CreatePlace { place, response }
    })
    .await;

    match result {
        Ok(place) => (StatusCode::CREATED, Json(json!(place))),
        Err(e) => error_response(e),
    }
}

pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(review): Json<NewReview>,
) -> impl IntoResponse {
    let result = dispatch(&state.place_channel, "Places", |response| {
        PlaceRequest::AddReview {
            id,
            review,
            response,
        }
    })
    .await;

    match result {
        Ok(place) => (StatusCode::OK, Json(json!(place))),
        Err(e) => error_response(e),
    }
}
