use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::{
    models::places::{NewPlace, NewReview, Place, Review},
    repositories::PlaceStore,
    utils::round_to_tenth,
};

pub enum PlaceRequest {
    ListPlaces {
        response: oneshot::Sender<Result<Vec<Place>, ServiceError>>,
    },
    GetPlace {
        id: String,
        response: oneshot::Sender<Result<Place, ServiceError>>,
    },
    CreatePlace {
        place: NewPlace,
        response: oneshot::Sender<Result<Place, ServiceError>>,
    },
    AddReview {
        id: String,
        review: NewReview,
        response: oneshot::Sender<Result<Place, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PlaceRequestHandler {
    repository: Arc<dyn PlaceStore>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Validation(format!("{} is required", field)))
}

impl PlaceRequestHandler {
    pub fn new(repository: Arc<dyn PlaceStore>) -> Self {
        PlaceRequestHandler { repository }
    }

    async fn list_places(&self) -> Result<Vec<Place>, ServiceError> {
        self.repository
            .list_places()
            .await
            .map_err(|e| ServiceError::repository("Places", e))
    }

    async fn get_place(&self, id: &str) -> Result<Place, ServiceError> {
        self.repository
            .get_place(id)
            .await
            .map_err(|e| ServiceError::repository("Places", e))?
            .ok_or(ServiceError::PlaceNotFound)
    }

    async fn create_place(&self, mut place: NewPlace) -> Result<Place, ServiceError> {
        let name = required(place.name.take(), "name")?;

        let place = self
            .repository
            .insert_place(name, place)
            .await
            .map_err(|e| ServiceError::repository("Places", e))?;

        log::info!("Created place {} ({}).", place.id, place.name);
        Ok(place)
    }

    async fn add_review(&self, id: &str, review: NewReview) -> Result<Place, ServiceError> {
        let comment = required(review.comment, "comment")?;
        let username = required(review.username, "username")?;
        let rating = match review.rating {
            Some(rating) if (1.0..=5.0).contains(&rating) => rating,
            _ => {
                return Err(ServiceError::Validation(
                    "rating must be between 1 and 5".to_string(),
                ))
            }
        };

        let place = self.get_place(id).await?;

        let mut reviews = place.reviews;
        reviews.push(Review {
            comment,
            rating,
            username,
            created_at: Utc::now(),
        });
        let average = average_rating(&reviews);

        self.repository
            .update_reviews(id, &reviews, average)
            .await
            .map_err(|e| ServiceError::repository("Places", e))?
            .ok_or(ServiceError::PlaceNotFound)
    }
}

/// Mean of all review ratings, rounded to one decimal.
fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }

    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    round_to_tenth(total / reviews.len() as f64)
}

#[async_trait]
impl RequestHandler<PlaceRequest> for PlaceRequestHandler {
    async fn handle_request(&self, request: PlaceRequest) {
        match request {
            PlaceRequest::ListPlaces { response } => {
                let _ = response.send(self.list_places().await);
            }
            PlaceRequest::GetPlace { id, response } => {
                let _ = response.send(self.get_place(&id).await);
            }
            PlaceRequest::CreatePlace { place, response } => {
                let _ = response.send(self.create_place(place).await);
            }
            PlaceRequest::AddReview {
                id,
                review,
                response,
            } => {
                let _ = response.send(self.add_review(&id, review).await);
            }
        }
    }
}

pub struct PlaceService;

impl PlaceService {
    pub fn new() -> Self {
        PlaceService {}
    }
}

#[async_trait]
impl Service<PlaceRequest, PlaceRequestHandler> for PlaceService {}
