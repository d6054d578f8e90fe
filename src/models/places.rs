use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub comment: String,
    pub rating: f64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reviews: Vec<Review>,
    pub points_multiplier: i32,
}

impl Place {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlaceRow {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reviews: Json<Vec<Review>>,
    pub points_multiplier: i32,
}

impl From<PlaceRow> for Place {
    fn from(row: PlaceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
            rating: row.rating,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            reviews: row.reviews.0,
            points_multiplier: row.points_multiplier,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewPlace {
    pub name: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewReview {
    pub comment: Option<String>,
    pub rating: Option<f64>,
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocationUpdate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
