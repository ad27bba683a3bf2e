use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window shared by every request through the layer.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    window: Arc<Mutex<WindowState>>,
}

impl RateLimiter {
    pub fn per_second(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            window: Arc::new(Mutex::new(WindowState {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    fn allow_at(&self, now: Instant) -> bool {
        // A poisoned window only holds counters; keep using it.
        let mut guard = self.window.lock().unwrap_or_else(|p| p.into_inner());
        if now.duration_since(guard.start) >= Duration::from_secs(1) {
            guard.start = now;
            guard.count = 0;
        }
        if guard.count < self.rps {
            guard.count += 1;
            true
        } else {
            false
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.allow() {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}
