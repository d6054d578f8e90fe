use std::sync::Arc;

use super::{
    notifications::{is_expo_push_token, PushMessage, PushNotifier},
    ServiceError,
};
use crate::{
    models::places::Place,
    repositories::{PlaceStore, UserStore},
    utils::haversine_distance,
};

pub const PROXIMITY_RADIUS_METERS: f64 = 500.0;

// Float rounding at the boundary must not push an exact 500 m over the radius.
const RADIUS_TOLERANCE_METERS: f64 = 1e-6;

pub const NEARBY_TITLE: &str = "You're nearby!";

pub fn is_within_radius(distance_meters: f64) -> bool {
    distance_meters <= PROXIMITY_RADIUS_METERS + RADIUS_TOLERANCE_METERS
}

/// Closest place inside the proximity radius, with its distance.
pub fn closest_within_radius(
    places: &[Place],
    latitude: f64,
    longitude: f64,
) -> Option<(&Place, f64)> {
    places
        .iter()
        .filter_map(|place| {
            let (lat, lon) = place.coordinates()?;
            Some((place, haversine_distance(latitude, longitude, lat, lon)))
        })
        .filter(|(_, distance)| is_within_radius(*distance))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
}

#[derive(Clone)]
pub struct ProximityNotifier {
    users: Arc<dyn UserStore>,
    places: Arc<dyn PlaceStore>,
    notifier: Arc<dyn PushNotifier>,
}

impl ProximityNotifier {
    pub fn new(
        users: Arc<dyn UserStore>,
        places: Arc<dyn PlaceStore>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Self {
        Self {
            users,
            places,
            notifier,
        }
    }

    /// Notifies the user about the closest place within the radius.
    ///
    /// Returns the place the user is near, whether or not a notification
    /// could be delivered. Users without a valid push token are skipped.
    pub async fn check_proximity(
        &self,
        user_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Place>, ServiceError> {
        let places = self
            .places
            .list_places_with_coordinates()
            .await
            .map_err(|e| ServiceError::repository("Places", e))?;

        let Some((place, distance)) = closest_within_radius(&places, latitude, longitude) else {
            return Ok(None);
        };
        log::debug!(
            "User {} is {:.0}m from {} ({}).",
            user_id,
            distance,
            place.name,
            place.id
        );

        let user = self
            .users
            .get_user(user_id)
            .await
            .map_err(|e| ServiceError::repository("Users", e))?;

        let token = user
            .and_then(|user| user.push_token)
            .filter(|token| is_expo_push_token(token));

        match token {
            Some(token) => {
                let message = PushMessage::new(
                    &token,
                    NEARBY_TITLE,
                    format!(
                        "You're near {}! Check in now and earn points!",
                        place.name
                    ),
                );
                if let Err(e) = self.notifier.send(message).await {
                    log::error!("Could not notify user {}: {}", user_id, e);
                }
            }
            None => log::debug!("User {} has no valid push token, skipping.", user_id),
        }

        Ok(Some(place.clone()))
    }
}
