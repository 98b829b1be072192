//! Requester extraction.
//!
//! Identity is issued upstream; the server only reads the forwarded user id
//! from the configured header and looks the role up in the user directory.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use taskdeck_proto::task::UserId;

use crate::api::AppState;
use crate::error::ApiError;
use crate::users::Requester;

impl FromRequestParts<Arc<AppState>> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(state.user_header())
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| UserId::parse(raw).ok())
            .ok_or(ApiError::Unauthorized("Not authorized, no token"))?;

        let requester = state.users.requester(&id).ok_or_else(|| {
            tracing::warn!(user = %id, "request from unknown user");
            ApiError::Unauthorized("Not authorized, user not found")
        })?;
        tracing::debug!(user = %requester.id, role = %requester.role, "requester identified");
        Ok(requester)
    }
}
