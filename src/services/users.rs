use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;

use super::{checkin::CheckInEngine, RequestHandler, Service, ServiceError};
use crate::{
    models::users::{CheckInOutcome, UserPoints},
    repositories::UserStore,
};

pub enum UserRequest {
    CheckIn {
        user_id: Option<String>,
        place_id: Option<String>,
        response: oneshot::Sender<Result<CheckInOutcome, ServiceError>>,
    },
    GetPoints {
        id: String,
        response: oneshot::Sender<Result<UserPoints, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    engine: CheckInEngine,
    repository: Arc<dyn UserStore>,
}

impl UserRequestHandler {
    pub fn new(engine: CheckInEngine, repository: Arc<dyn UserStore>) -> Self {
        UserRequestHandler { engine, repository }
    }

    async fn get_points(&self, id: &str) -> Result<UserPoints, ServiceError> {
        self.repository
            .get_user(id)
            .await
            .map_err(|e| ServiceError::repository("Users", e))?
            .map(UserPoints::from)
            .ok_or(ServiceError::UserNotFound)
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::CheckIn {
                user_id,
                place_id,
                response,
            } => {
                let result = self
                    .engine
                    .check_in(user_id.as_deref(), place_id.as_deref(), Utc::now())
                    .await;
                let _ = response.send(result);
            }
            UserRequest::GetPoints { id, response } => {
                let points = self.get_points(&id).await;
                let _ = response.send(points);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
