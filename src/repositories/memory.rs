use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{PlaceStore, UserStore};
use crate::models::{
    places::{NewPlace, Place, Review},
    users::UserLedger,
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserLedger>,
    saves: AtomicUsize,
}

impl MemoryUserStore {
    pub fn with_users(users: impl IntoIterator<Item = UserLedger>) -> Self {
        let store = Self::default();
        for user in users {
            store.users.insert(user.id.clone(), user);
        }
        store
    }

    pub fn user(&self, id: &str) -> Option<UserLedger> {
        self.users.get(id).map(|entry| entry.value().clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, id: &str) -> Result<Option<UserLedger>, anyhow::Error> {
        Ok(self.user(id))
    }

    async fn save_user(&self, user: &UserLedger) -> Result<(), anyhow::Error> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        match self.users.get_mut(&user.id) {
            Some(mut entry) => {
                *entry = user.clone();
                Ok(())
            }
            None => anyhow::bail!("User not found: {}", user.id),
        }
    }
}

#[derive(Default)]
pub struct MemoryPlaceStore {
    places: DashMap<String, Place>,
    order: std::sync::Mutex<Vec<String>>,
}

impl MemoryPlaceStore {
    pub fn with_places(places: impl IntoIterator<Item = Place>) -> Self {
        let store = Self::default();
        for place in places {
            store.put(place);
        }
        store
    }

    pub fn put(&self, place: Place) {
        self.order.lock().unwrap().push(place.id.clone());
        self.places.insert(place.id.clone(), place);
    }

    fn ordered(&self) -> Vec<Place> {
        let order = self.order.lock().unwrap().clone();
        order
            .iter()
            .filter_map(|id| self.places.get(id).map(|entry| entry.value().clone()))
            .collect()
    }
}

pub fn place(id: &str, name: &str) -> Place {
    Place {
        id: id.to_string(),
        name: name.to_string(),
        image: None,
        rating: None,
        location: None,
        latitude: None,
        longitude: None,
        reviews: Vec::new(),
        points_multiplier: 1,
    }
}

pub fn place_at(id: &str, name: &str, latitude: f64, longitude: f64) -> Place {
    Place {
        latitude: Some(latitude),
        longitude: Some(longitude),
        ..place(id, name)
    }
}

#[async_trait]
impl PlaceStore for MemoryPlaceStore {
    async fn get_place(&self, id: &str) -> Result<Option<Place>, anyhow::Error> {
        Ok(self.places.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_places(&self) -> Result<Vec<Place>, anyhow::Error> {
        Ok(self.ordered())
    }

    async fn list_places_with_coordinates(&self) -> Result<Vec<Place>, anyhow::Error> {
        Ok(self
            .ordered()
            .into_iter()
            .filter(|place| place.coordinates().is_some())
            .collect())
    }

    async fn insert_place(&self, name: String, new_place: NewPlace) -> Result<Place, anyhow::Error> {
        let place = Place {
            image: new_place.image,
            rating: new_place.rating,
            location: new_place.location,
            latitude: new_place.latitude,
            longitude: new_place.longitude,
            ..place(&uuid::Uuid::new_v4().to_string(), &name)
        };
        self.put(place.clone());
        Ok(place)
    }

    async fn update_reviews(
        &self,
        id: &str,
        reviews: &[Review],
        rating: f64,
    ) -> Result<Option<Place>, anyhow::Error> {
        Ok(self.places.get_mut(id).map(|mut entry| {
            entry.reviews = reviews.to_vec();
            entry.rating = Some(rating);
            entry.value().clone()
        }))
    }

    async fn reset_multipliers(&self) -> Result<u64, anyhow::Error> {
        let mut count = 0;
        for mut entry in self.places.iter_mut() {
            entry.points_multiplier = 1;
            count += 1;
        }
        Ok(count)
    }

    async fn set_multiplier(&self, id: &str, multiplier: i32) -> Result<(), anyhow::Error> {
        if let Some(mut entry) = self.places.get_mut(id) {
            entry.points_multiplier = multiplier;
        }
        Ok(())
    }
}
