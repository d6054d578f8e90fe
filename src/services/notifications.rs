use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::oneshot;

use super::{proximity::ProximityNotifier, RequestHandler, Service, ServiceError};
use crate::models::places::Place;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new(to: &str, title: &str, body: String) -> Self {
        Self {
            to: to.to_string(),
            sound: "default".to_string(),
            title: title.to_string(),
            body,
        }
    }
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: PushMessage) -> Result<(), anyhow::Error>;
}

/// Whether `token` looks like an address the Expo push service accepts.
pub fn is_expo_push_token(token: &str) -> bool {
    let bracketed = (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']');

    bracketed || is_hyphenated_uuid(token)
}

fn is_hyphenated_uuid(token: &str) -> bool {
    let groups: Vec<&str> = token.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| {
                group.len() == len && group.chars().all(|c| c.is_ascii_alphanumeric())
            })
}

pub struct ExpoPushNotifier {
    client: reqwest::Client,
    url: String,
}

impl ExpoPushNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PushNotifier for ExpoPushNotifier {
    async fn send(&self, message: PushMessage) -> Result<(), anyhow::Error> {
        let response = self
            .client
            .post(&self.url)
            .json(&[&message])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Expo push rejected ({}): {}", status, body);
        }

        log::debug!("Sent push notification to {}.", message.to);
        Ok(())
    }
}

pub enum NotificationRequest {
    UpdateLocation {
        user_id: String,
        latitude: f64,
        longitude: f64,
        response: oneshot::Sender<Result<Option<Place>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct NotificationRequestHandler {
    proximity: ProximityNotifier,
}

impl NotificationRequestHandler {
    pub fn new(proximity: ProximityNotifier) -> Self {
        Self { proximity }
    }
}

#[async_trait]
impl RequestHandler<NotificationRequest> for NotificationRequestHandler {
    async fn handle_request(&self, request: NotificationRequest) {
        match request {
            NotificationRequest::UpdateLocation {
                user_id,
                latitude,
                longitude,
                response,
            } => {
                let result = self
                    .proximity
                    .check_proximity(&user_id, latitude, longitude)
                    .await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        NotificationService {}
    }
}

#[async_trait]
impl Service<NotificationRequest, NotificationRequestHandler> for NotificationService {}
