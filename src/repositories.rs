use async_trait::async_trait;

use crate::models::{
    places::{NewPlace, Place, Review},
    users::UserLedger,
};

#[cfg(test)]
pub mod memory;
pub mod places;
pub mod users;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<UserLedger>, anyhow::Error>;

    /// Writes the whole ledger back in one statement.
    async fn save_user(&self, user: &UserLedger) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn get_place(&self, id: &str) -> Result<Option<Place>, anyhow::Error>;

    async fn list_places(&self) -> Result<Vec<Place>, anyhow::Error>;

    /// Places that have both a latitude and a longitude.
    async fn list_places_with_coordinates(&self) -> Result<Vec<Place>, anyhow::Error>;

    async fn insert_place(&self, name: String, place: NewPlace) -> Result<Place, anyhow::Error>;

    async fn update_reviews(
        &self,
        id: &str,
        reviews: &[Review],
        rating: f64,
    ) -> Result<Option<Place>, anyhow::Error>;

    async fn reset_multipliers(&self) -> Result<u64, anyhow::Error>;

    async fn set_multiplier(&self, id: &str, multiplier: i32) -> Result<(), anyhow::Error>;
}
