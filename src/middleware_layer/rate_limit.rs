use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sonic_rs::JsonValueTrait;
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Failed attempts allowed per username before logins are refused.
const MAX_FAILED_LOGINS: i32 = 5;
/// How long failed attempts are remembered, in seconds.
const FAILED_LOGIN_WINDOW_SECS: i64 = 43200;
/// Largest login body the limiter will buffer.
const MAX_LOGIN_BODY_BYTES: usize = 16 * 1024;

fn extract_username_from_body(body_bytes: &[u8]) -> Option<String> {
    sonic_rs::from_slice::<sonic_rs::Value>(body_bytes)
        .ok()?
        .get("username")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Builds the Redis key for a client's failed-login counter on one username.
fn login_key(ip: &str, username: &str) -> String {
    format!("rate_limit:login:{}:{}", ip, username.trim().to_lowercase())
}

/// Only rejected credentials count against the limit.
fn counts_as_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
}

/// A middleware that rate limits admin login attempts per client IP and
/// username.
///
/// Only `401` answers from the login handler count as failures; a success
/// resets the counter. Bodies without a username go straight to the handler,
/// which rejects them. Redis outages fail open.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_LOGIN_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Request body too large".to_string()).into_response();
        }
    };

    let Some(username) = extract_username_from_body(&body_bytes) else {
        return next.run(Request::from_parts(parts, Body::from(body_bytes))).await;
    };
    let key = login_key(&ip, &username);

    let count: Option<i32> = redis::cmd("GET")
        .arg(&key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(None);

    if let Some(attempts) = count {
        if attempts >= MAX_FAILED_LOGINS {
            let ttl: Option<i64> = redis::cmd("TTL")
                .arg(&key)
                .query_async(&mut state.redis.clone())
                .await
                .unwrap_or(None);

            return AppError::RateLimitExceeded(format!(
                "Too many failed login attempts. Try again in {} minutes",
                ttl.unwrap_or(0).max(0) / 60
            ))
            .into_response();
        }
    }

    let response = next.run(Request::from_parts(parts, Body::from(body_bytes))).await;

    if counts_as_failure(response.status()) {
        let _: () = redis::pipe()
            .cmd("INCR")
            .arg(&key)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(FAILED_LOGIN_WINDOW_SECS)
            .ignore()
            .query_async(&mut state.redis.clone())
            .await
            .unwrap_or(());
    } else if response.status().is_success() {
        let _: () = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut state.redis.clone())
            .await
            .unwrap_or(());
    }

    response
}
