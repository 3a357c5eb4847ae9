//! Liveness and readiness probes for orchestrators and load balancers.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::debug;

const STARTING: u8 = 0;
const SERVING: u8 = 1;
const DRAINING: u8 = 2;

/// Lifecycle phase shared by every worker.
///
/// Starting: alive, not ready. Serving: both. Draining: neither, so the
/// balancer stops routing traffic while in-flight requests finish.
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(STARTING),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move from starting to serving. Has no effect once draining.
    pub fn mark_ready(&self) {
        if let Err(phase) =
            self.phase
                .compare_exchange(STARTING, SERVING, Ordering::AcqRel, Ordering::Acquire)
        {
            debug!(phase, "readiness left unchanged");
        }
    }

    pub fn mark_draining(&self) {
        self.phase.store(DRAINING, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.phase.load(Ordering::Acquire) == SERVING
    }

    pub fn is_alive(&self) -> bool {
        self.phase.load(Ordering::Acquire) != DRAINING
    }
}

fn probe_response(passing: bool) -> HttpResponse {
    let mut response = if passing {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// Readiness probe: 200 while serving, 503 while starting or draining.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is starting or draining")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_ready())
}

/// Liveness probe: 200 until shutdown begins.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::App;
    use actix_web::test::{TestRequest, call_service, init_service};
    use rstest::rstest;

    async fn get_health(state: web::Data<HealthState>, uri: &str) -> (StatusCode, Option<String>) {
        let app = init_service(
            App::new()
                .app_data(state)
                .service(ready)
                .service(live),
        )
        .await;
        let res = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        let cache = res
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        (res.status(), cache)
    }

    #[actix_web::test]
    async fn readiness_follows_state() {
        let state = web::Data::new(HealthState::new());
        let (before, cache) = get_health(state.clone(), "/health/ready").await;
        assert_eq!(before, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cache.as_deref(), Some("no-store"));

        state.mark_ready();
        let (after, _) = get_health(state, "/health/ready").await;
        assert_eq!(after, StatusCode::OK);
    }

    #[actix_web::test]
    async fn draining_fails_both_probes() {
        let state = web::Data::new(HealthState::new());
        state.mark_ready();
        assert_eq!(get_health(state.clone(), "/health/live").await.0, StatusCode::OK);

        state.mark_draining();
        assert_eq!(
            get_health(state.clone(), "/health/live").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_health(state, "/health/ready").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    fn draining_is_terminal() {
        let state = HealthState::new();
        state.mark_draining();
        state.mark_ready();
        assert!(!state.is_ready());
        assert!(!state.is_alive());
    }
}
