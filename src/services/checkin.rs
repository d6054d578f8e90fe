use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::ServiceError;
use crate::{
    models::users::{CheckInOutcome, PointsHistoryEntry, CHECK_IN_HISTORY_TYPE},
    repositories::{PlaceStore, UserStore},
};

pub const CHECK_IN_POINTS: i32 = 10;
pub const REWARD_THRESHOLD: i32 = 180;
pub const REWARD_DISCOUNT_PERCENT: u32 = 20;
pub const CHECK_IN_COOLDOWN_HOURS: i64 = 24;

/// Accepts check-ins, credits points and issues rewards.
///
/// The ledger is read, modified in memory and written back with a single
/// save. Nothing is written when a check-in is rejected.
#[derive(Clone)]
pub struct CheckInEngine {
    users: Arc<dyn UserStore>,
    places: Arc<dyn PlaceStore>,
    rng: Arc<Mutex<StdRng>>,
}

impl CheckInEngine {
    pub fn new(users: Arc<dyn UserStore>, places: Arc<dyn PlaceStore>, rng: StdRng) -> Self {
        Self {
            users,
            places,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn from_entropy(users: Arc<dyn UserStore>, places: Arc<dyn PlaceStore>) -> Self {
        Self::new(users, places, StdRng::from_entropy())
    }

    pub async fn check_in(
        &self,
        user_id: Option<&str>,
        place_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, ServiceError> {
        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::NotAuthenticated)?;
        let place_id = place_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Validation("placeId is required".to_string()))?;

        let mut user = self
            .users
            .get_user(user_id)
            .await
            .map_err(|e| ServiceError::repository("Users", e))?
            .ok_or(ServiceError::UserNotFound)?;

        self.places
            .get_place(place_id)
            .await
            .map_err(|e| ServiceError::repository("Places", e))?
            .ok_or(ServiceError::PlaceNotFound)?;

        if let Some(last_check_in) = user.last_check_in_at(place_id) {
            if now - last_check_in < Duration::hours(CHECK_IN_COOLDOWN_HOURS) {
                log::debug!(
                    "Rejected check-in: user={}, place={}, last={}",
                    user_id,
                    place_id,
                    last_check_in
                );
                return Err(ServiceError::CooldownActive);
            }
        }

        user.points += CHECK_IN_POINTS;
        user.checked_in_places.push(place_id.to_string());
        user.place_check_ins.insert(place_id.to_string(), now);

        let mut reward = None;
        let reward_given = user.points >= REWARD_THRESHOLD && !user.checked_in_places.is_empty();
        if reward_given {
            reward = self.draw_reward(&user.checked_in_places).await?;
            if let Some(description) = &reward {
                user.rewards.push(description.clone());
            }
            user.points = 0;
        }

        user.points_history.push(PointsHistoryEntry {
            kind: CHECK_IN_HISTORY_TYPE.to_string(),
            place_id: place_id.to_string(),
            points_earned: CHECK_IN_POINTS,
            timestamp: now,
        });

        self.users
            .save_user(&user)
            .await
            .map_err(|e| ServiceError::repository("Users", e))?;

        log::info!(
            "Check-in accepted: user={}, place={}, points={}, reward_given={}",
            user_id,
            place_id,
            user.points,
            reward_given
        );

        Ok(CheckInOutcome {
            points_earned: CHECK_IN_POINTS,
            reward_given,
            reward,
        })
    }

    /// Picks one of the user's past check-ins and describes the discount.
    /// A place that no longer exists forfeits the reward.
    async fn draw_reward(&self, pool: &[String]) -> Result<Option<String>, ServiceError> {
        let index = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| ServiceError::Internal(format!("Reward rng poisoned: {}", e)))?;
            rng.gen_range(0..pool.len())
        };
        let place_id = &pool[index];

        let place = self
            .places
            .get_place(place_id)
            .await
            .map_err(|e| ServiceError::repository("Places", e))?;

        match place {
            Some(place) => Ok(Some(format!(
                "{}% Discount at {}",
                REWARD_DISCOUNT_PERCENT, place.name
            ))),
            None => {
                log::warn!("Reward forfeited, place {} no longer exists.", place_id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        models::{
            places::{NewPlace, Place, Review},
            users::UserLedger,
        },
        repositories::memory::{place, MemoryPlaceStore, MemoryUserStore},
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn setup(
        user: UserLedger,
        place_count: usize,
    ) -> (CheckInEngine, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::with_users([user]));
        let places = Arc::new(MemoryPlaceStore::with_places(
            (1..=place_count).map(|i| place(&format!("p{}", i), &format!("Place {}", i))),
        ));
        let engine = CheckInEngine::new(users.clone(), places, StdRng::seed_from_u64(7));
        (engine, users)
    }

    #[tokio::test]
    async fn first_check_in_awards_points() {
        let (engine, users) = setup(UserLedger::new("u1"), 1);

        let outcome = engine.check_in(Some("u1"), Some("p1"), now()).await.unwrap();

        assert_eq!(outcome.points_earned, 10);
        assert!(!outcome.reward_given);
        let user = users.user("u1").unwrap();
        assert_eq!(user.points, 10);
        assert_eq!(user.checked_in_places, vec!["p1".to_string()]);
        assert_eq!(user.last_check_in_at("p1"), Some(now()));
        assert_eq!(user.points_history.len(), 1);
        assert_eq!(user.points_history[0].kind, "Place Check-in");
        assert_eq!(user.points_history[0].points_earned, 10);
        assert_eq!(user.points_history[0].timestamp, now());
    }

    #[tokio::test]
    async fn cooldown_rejects_without_touching_ledger() {
        let mut user = UserLedger::new("u1");
        user.points = 40;
        user.checked_in_places.push("p1".to_string());
        user.place_check_ins
            .insert("p1".to_string(), now() - Duration::hours(23));
        let (engine, users) = setup(user.clone(), 1);

        let result = engine.check_in(Some("u1"), Some("p1"), now()).await;

        assert!(matches!(result, Err(ServiceError::CooldownActive)));
        assert_eq!(users.user("u1").unwrap(), user);
        assert_eq!(users.save_count(), 0);
    }

    #[tokio::test]
    async fn cooldown_ends_after_a_full_day() {
        let mut user = UserLedger::new("u1");
        user.place_check_ins
            .insert("p1".to_string(), now() - Duration::hours(24));
        let (engine, users) = setup(user, 1);

        engine.check_in(Some("u1"), Some("p1"), now()).await.unwrap();

        assert_eq!(users.user("u1").unwrap().last_check_in_at("p1"), Some(now()));
    }

    #[tokio::test]
    async fn cooldown_is_per_place() {
        let (engine, users) = setup(UserLedger::new("u1"), 2);

        engine.check_in(Some("u1"), Some("p1"), now()).await.unwrap();
        engine
            .check_in(Some("u1"), Some("p2"), now() + Duration::minutes(30))
            .await
            .unwrap();

        let user = users.user("u1").unwrap();
        assert_eq!(user.points, 20);
        assert_eq!(user.place_check_ins.len(), 2);
    }

    #[tokio::test]
    async fn reward_after_eighteen_places() {
        let (engine, users) = setup(UserLedger::new("u1"), 18);

        for i in 1..=17 {
            let outcome = engine
                .check_in(Some("u1"), Some(&format!("p{}", i)), now())
                .await
                .unwrap();
            assert!(!outcome.reward_given);
        }
        assert_eq!(users.user("u1").unwrap().points, 170);

        let outcome = engine.check_in(Some("u1"), Some("p18"), now()).await.unwrap();

        assert!(outcome.reward_given);
        let user = users.user("u1").unwrap();
        assert_eq!(user.points, 0);
        assert_eq!(user.rewards.len(), 1);
        assert!(user.rewards[0].starts_with("20% Discount at Place "));
        assert_eq!(outcome.reward.as_deref(), Some(user.rewards[0].as_str()));
        assert_eq!(user.points_history.len(), 18);
    }

    #[tokio::test]
    async fn single_entry_pool_rewards_that_place() {
        let mut user = UserLedger::new("u1");
        user.points = 170;
        let (engine, users) = setup(user, 1);

        let outcome = engine.check_in(Some("u1"), Some("p1"), now()).await.unwrap();

        assert!(outcome.reward_given);
        let user = users.user("u1").unwrap();
        assert_eq!(user.rewards, vec!["20% Discount at Place 1".to_string()]);
        assert_eq!(user.points, 0);
    }

    /// Serves each place once, as if it was deleted right after the lookup.
    struct VanishingPlaces {
        inner: MemoryPlaceStore,
        served: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PlaceStore for VanishingPlaces {
        async fn get_place(&self, id: &str) -> Result<Option<Place>, anyhow::Error> {
            {
                let mut served = self.served.lock().unwrap();
                if served.iter().any(|seen| seen == id) {
                    return Ok(None);
                }
                served.push(id.to_string());
            }
            self.inner.get_place(id).await
        }

        async fn list_places(&self) -> Result<Vec<Place>, anyhow::Error> {
            self.inner.list_places().await
        }

        async fn list_places_with_coordinates(&self) -> Result<Vec<Place>, anyhow::Error> {
            self.inner.list_places_with_coordinates().await
        }

        async fn insert_place(&self, name: String, place: NewPlace) -> Result<Place, anyhow::Error> {
            self.inner.insert_place(name, place).await
        }

        async fn update_reviews(
            &self,
            id: &str,
            reviews: &[Review],
            rating: f64,
        ) -> Result<Option<Place>, anyhow::Error> {
            self.inner.update_reviews(id, reviews, rating).await
        }

        async fn reset_multipliers(&self) -> Result<u64, anyhow::Error> {
            self.inner.reset_multipliers().await
        }

        async fn set_multiplier(&self, id: &str, multiplier: i32) -> Result<(), anyhow::Error> {
            self.inner.set_multiplier(id, multiplier).await
        }
    }

    #[tokio::test]
    async fn deleted_reward_place_is_forfeited() {
        let users = Arc::new(MemoryUserStore::with_users([UserLedger {
            points: 170,
            ..UserLedger::new("u1")
        }]));
        let places = Arc::new(VanishingPlaces {
            inner: MemoryPlaceStore::with_places([place("p1", "Place 1")]),
            served: Default::default(),
        });
        let engine = CheckInEngine::new(users.clone(), places, StdRng::seed_from_u64(1));

        let outcome = engine.check_in(Some("u1"), Some("p1"), now()).await.unwrap();

        assert!(outcome.reward_given);
        assert_eq!(outcome.reward, None);
        let user = users.user("u1").unwrap();
        assert_eq!(user.points, 0);
        assert!(user.rewards.is_empty());
        assert_eq!(user.points_history.len(), 1);
    }

    #[tokio::test]
    async fn missing_user_id_is_unauthenticated() {
        let (engine, _) = setup(UserLedger::new("u1"), 1);

        let missing = engine.check_in(None, Some("p1"), now()).await;
        let empty = engine.check_in(Some(""), Some("p1"), now()).await;

        assert!(matches!(missing, Err(ServiceError::NotAuthenticated)));
        assert!(matches!(empty, Err(ServiceError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn missing_place_id_is_validation_error() {
        let (engine, _) = setup(UserLedger::new("u1"), 1);

        let result = engine.check_in(Some("u1"), None, now()).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_user_and_place() {
        let (engine, users) = setup(UserLedger::new("u1"), 1);

        let no_user = engine.check_in(Some("nobody"), Some("p1"), now()).await;
        let no_place = engine.check_in(Some("u1"), Some("nowhere"), now()).await;

        assert!(matches!(no_user, Err(ServiceError::UserNotFound)));
        assert!(matches!(no_place, Err(ServiceError::PlaceNotFound)));
        assert_eq!(users.save_count(), 0);
    }
}
