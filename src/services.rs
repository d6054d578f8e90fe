use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::{
    repositories::{places::PlaceRepository, users::UserRepository, PlaceStore, UserStore},
    settings::Settings,
};

pub mod bonus;
pub mod checkin;
pub mod http;
pub mod notifications;
pub mod places;
pub mod proximity;
pub mod users;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("User not logged in!")]
    NotAuthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Place not found")]
    PlaceNotFound,
    #[error("Already checked in at this place in the last 24 hours!")]
    CooldownActive,
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn repository(name: &str, e: anyhow::Error) -> Self {
        ServiceError::Repository(name.to_string(), e.to_string())
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (place_tx, mut place_rx) = mpsc::channel(512);
    let (notification_tx, mut notification_rx) = mpsc::channel(512);

    let user_store: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
    let place_store: Arc<dyn PlaceStore> = Arc::new(PlaceRepository::new(pool));
    let push_notifier = Arc::new(notifications::ExpoPushNotifier::new(&settings.push.url));

    let mut user_service = users::UserService::new();
    let mut place_service = places::PlaceService::new();
    let mut notification_service = notifications::NotificationService::new();

    log::info!("Starting user service.");
    let user_handler = users::UserRequestHandler::new(
        checkin::CheckInEngine::from_entropy(user_store.clone(), place_store.clone()),
        user_store.clone(),
    );
    tokio::spawn(async move {
        user_service.run(user_handler, &mut user_rx).await;
    });

    log::info!("Starting place service.");
    let place_handler = places::PlaceRequestHandler::new(place_store.clone());
    tokio::spawn(async move {
        place_service.run(place_handler, &mut place_rx).await;
    });

    log::info!("Starting notification service.");
    let notification_handler = notifications::NotificationRequestHandler::new(
        proximity::ProximityNotifier::new(user_store, place_store.clone(), push_notifier),
    );
    tokio::spawn(async move {
        notification_service
            .run(notification_handler, &mut notification_rx)
            .await;
    });

    log::info!("Starting daily bonus task.");
    bonus::DailyBonus::from_entropy(place_store).start();

    log::info!("Starting HTTP server.");
    http::start_http_server(
        &settings.server.listen,
        http::AppState::new(user_tx, place_tx, notification_tx, &settings.auth.jwt_secret),
    )
    .await
}
