use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, Validation};
use serde::{Deserialize, Serialize};

use super::{error_response, AppState, ErrorResponse};
use crate::services::ServiceError;

/// Claims carried by tokens issued at login.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

/// Id of the user behind a valid `Authorization: Bearer` token.
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| error_response(ServiceError::NotAuthenticated))?;

        let data = decode::<Claims>(token, &state.jwt_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                log::debug!("Rejected token: {}", e);
                error_response(ServiceError::NotAuthenticated)
            })?;

        Ok(AuthUser(data.claims.id))
    }
}
