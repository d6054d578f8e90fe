use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{models::places::Place, repositories::PlaceStore};

pub const BONUS_MULTIPLIER: i32 = 2;

/// Once a day, doubles the points multiplier of one random place.
#[derive(Clone)]
pub struct DailyBonus {
    places: Arc<dyn PlaceStore>,
    rng: Arc<Mutex<StdRng>>,
}

/// Time left until the next UTC midnight.
pub fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return Duration::from_secs(24 * 60 * 60);
    };
    let midnight = tomorrow.and_time(NaiveTime::MIN).and_utc();

    (midnight - now).to_std().unwrap_or_default()
}

impl DailyBonus {
    pub fn new(places: Arc<dyn PlaceStore>, rng: StdRng) -> Self {
        Self {
            places,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn from_entropy(places: Arc<dyn PlaceStore>) -> Self {
        Self::new(places, StdRng::from_entropy())
    }

    pub fn start(self) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(until_next_midnight(Utc::now())).await;

                match self.apply().await {
                    Ok(Some(place)) => {
                        log::info!("Daily bonus set for: {} ({}).", place.name, place.id)
                    }
                    Ok(None) => log::info!("No places, skipping daily bonus."),
                    Err(e) => log::error!("Error setting daily bonus: {}", e),
                }
            }
        });

        log::info!("Daily bonus task started");
    }

    /// Resets every multiplier to 1 and gives one random place the bonus.
    pub async fn apply(&self) -> Result<Option<Place>, anyhow::Error> {
        self.places.reset_multipliers().await?;

        let places = self.places.list_places().await?;
        if places.is_empty() {
            return Ok(None);
        }

        let index = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| anyhow::anyhow!("Bonus rng poisoned: {}", e))?;
            rng.gen_range(0..places.len())
        };

        let Some(mut place) = places.into_iter().nth(index) else {
            return Ok(None);
        };
        self.places
            .set_multiplier(&place.id, BONUS_MULTIPLIER)
            .await?;
        place.points_multiplier = BONUS_MULTIPLIER;

        Ok(Some(place))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::repositories::memory::{place, MemoryPlaceStore};

    #[test]
    fn waits_until_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();

        assert_eq!(until_next_midnight(now), Duration::from_secs(30 * 60));
    }

    #[test]
    fn at_midnight_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(until_next_midnight(now), Duration::from_secs(24 * 60 * 60));
    }

    #[tokio::test]
    async fn exactly_one_place_gets_the_bonus() {
        let store = Arc::new(MemoryPlaceStore::with_places([
            place("p1", "A"),
            place("p2", "B"),
            place("p3", "C"),
        ]));
        store.set_multiplier("p2", BONUS_MULTIPLIER).await.unwrap();
        let bonus = DailyBonus::new(store.clone(), StdRng::seed_from_u64(3));

        let chosen = bonus.apply().await.unwrap().unwrap();

        let places = store.list_places().await.unwrap();
        let boosted: Vec<&str> = places
            .iter()
            .filter(|p| p.points_multiplier == BONUS_MULTIPLIER)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(boosted, vec![chosen.id.as_str()]);
        assert_eq!(chosen.points_multiplier, BONUS_MULTIPLIER);
    }

    #[tokio::test]
    async fn empty_catalogue_is_noop() {
        let bonus = DailyBonus::new(Arc::new(MemoryPlaceStore::default()), StdRng::seed_from_u64(3));

        assert!(bonus.apply().await.unwrap().is_none());
    }
}
