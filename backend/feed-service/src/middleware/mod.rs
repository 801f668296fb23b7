//! Request guards for the feed service
//!
//! [`CurrentUser`] is the only way a handler learns who is calling. Extracting it
//! runs the bearer check, verifies the token and loads the account; any failure
//! short-circuits the request with a 401 envelope.

pub mod permissions;

use actix_middleware::{extract_bearer_token, get_correlation_id};
use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture};
use std::ops::Deref;

use crate::error::AppError;
use crate::models::UserSummary;
use crate::services::AuthService;

/// Authenticated caller, without any credential material
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub UserSummary);

impl Deref for CurrentUser {
    type Target = UserSummary;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<CurrentUser>().cloned() {
            return Box::pin(ready(Ok(user)));
        }

        let req = req.clone();
        Box::pin(async move {
            let token = extract_bearer_token(req.headers())?.to_string();
            let auth = req
                .app_data::<web::Data<AuthService>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("auth service not configured".to_string()))?;

            let user = auth.authenticate(&token).await?;
            let current = CurrentUser(UserSummary::from(&user));

            tracing::debug!(
                user_id = %current.id,
                correlation_id = %get_correlation_id(&req),
                "Request authenticated"
            );
            req.extensions_mut().insert(current.clone());
            Ok(current)
        })
    }
}
