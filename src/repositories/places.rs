use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::PlaceStore;
use crate::models::places::{NewPlace, Place, PlaceRow, Review};

const PLACE_COLUMNS: &str =
    "id, name, image, rating, location, latitude, longitude, reviews, points_multiplier";

#[derive(Clone)]
pub struct PlaceRepository {
    conn: PgPool,
}

impl PlaceRepository {
    pub fn new(conn: PgPool) -> Self {
        PlaceRepository { conn }
    }
}

#[async_trait]
impl PlaceStore for PlaceRepository {
    async fn get_place(&self, id: &str) -> Result<Option<Place>, anyhow::Error> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {} FROM places WHERE id = $1",
            PLACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(row.map(Place::from))
    }

    async fn list_places(&self) -> Result<Vec<Place>, anyhow::Error> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {} FROM places ORDER BY created_at",
            PLACE_COLUMNS
        ))
        .fetch_all(&self.conn)
        .await?;

        Ok(rows.into_iter().map(Place::from).collect())
    }

    async fn list_places_with_coordinates(&self) -> Result<Vec<Place>, anyhow::Error> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {} FROM places WHERE latitude IS NOT NULL AND longitude IS NOT NULL ORDER BY created_at",
            PLACE_COLUMNS
        ))
        .fetch_all(&self.conn)
        .await?;

        Ok(rows.into_iter().map(Place::from).collect())
    }

    async fn insert_place(&self, name: String, place: NewPlace) -> Result<Place, anyhow::Error> {
        let place_id = Uuid::new_v4().hyphenated().to_string();

        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            r#"
                INSERT INTO places (id, name, image, rating, location, latitude, longitude)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {}
            "#,
            PLACE_COLUMNS
        ))
        .bind(place_id)
        .bind(name)
        .bind(place.image)
        .bind(place.rating)
        .bind(place.location)
        .bind(place.latitude)
        .bind(place.longitude)
        .fetch_one(&self.conn)
        .await?;

        Ok(row.into())
    }

    async fn update_reviews(
        &self,
        id: &str,
        reviews: &[Review],
        rating: f64,
    ) -> Result<Option<Place>, anyhow::Error> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            r#"
                UPDATE places SET reviews = $2, rating = $3, updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING {}
            "#,
            PLACE_COLUMNS
        ))
        .bind(id)
        .bind(Json(reviews))
        .bind(rating)
        .fetch_optional(&self.conn)
        .await?;

        Ok(row.map(Place::from))
    }

    async fn reset_multipliers(&self) -> Result<u64, anyhow::Error> {
        let result = sqlx::query("UPDATE places SET points_multiplier = 1")
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_multiplier(&self, id: &str, multiplier: i32) -> Result<(), anyhow::Error> {
        sqlx::query(
            "UPDATE places SET points_multiplier = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(multiplier)
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}
