//! Account handlers: signup, login and the current-user lookup

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{UserId, UserProfile};
use crate::services::{AuthService, AuthSession};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Payload returned by signup and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            id: session.user.id,
            username: session.user.username,
            email: session.user.email,
            token: session.token,
        }
    }
}

pub async fn signup(
    auth: web::Data<AuthService>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let session = auth
        .signup(
            req.username.as_deref(),
            req.email.as_deref(),
            req.password.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User created successfully",
        "data": SessionResponse::from(session),
    })))
}

pub async fn login(
    auth: web::Data<AuthService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = auth
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login successful",
        "data": SessionResponse::from(session),
    })))
}

pub async fn me(auth: web::Data<AuthService>, user: CurrentUser) -> Result<HttpResponse> {
    let account = auth.me(user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": UserProfile::from(&account),
    })))
}
