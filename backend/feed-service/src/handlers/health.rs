use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db;

/// Storage handle probed by the health endpoint; `None` when running in memory
pub struct HealthState {
    pub pool: Option<PgPool>,
}

pub async fn health_check(state: web::Data<HealthState>) -> HttpResponse {
    let Some(pool) = state.pool.as_ref() else {
        return HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "feed-service",
            "version": env!("CARGO_PKG_VERSION"),
            "storage": "memory",
        }));
    };

    match db::ping(pool).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "feed-service",
            "version": env!("CARGO_PKG_VERSION"),
            "storage": "postgres",
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "feed-service",
                "storage": "postgres",
            }))
        }
    }
}
