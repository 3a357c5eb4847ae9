//! Prometheus request metrics, compiled in with the `metrics` feature.

use std::fmt::Display;
use std::sync::Arc;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use prometheus::Registry;
use tracing::{info, warn};

const METRICS_NAMESPACE: &str = "docket";
const METRICS_ENDPOINT: &str = "/metrics";
/// Probe traffic would swamp the request histograms.
const UNMEASURED_PATHS: [&str; 3] = ["/health/ready", "/health/live", METRICS_ENDPOINT];

/// Middleware serving `/metrics`, or `None` when the registry refused it.
pub(crate) fn prometheus_middleware() -> Option<PrometheusMetrics> {
    enabled_or_warn(
        UNMEASURED_PATHS
            .iter()
            .fold(
                PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
                    .registry(Registry::new())
                    .endpoint(METRICS_ENDPOINT),
                |builder, path| builder.exclude(*path),
            )
            .build(),
    )
}

fn enabled_or_warn<E: Display>(built: Result<PrometheusMetrics, E>) -> Option<PrometheusMetrics> {
    match built {
        Ok(metrics) => {
            info!(endpoint = METRICS_ENDPOINT, "request metrics enabled");
            Some(metrics)
        }
        Err(error) => {
            warn!(%error, "request metrics disabled");
            None
        }
    }
}

/// Wraps the app in the Prometheus middleware when one was built.
#[derive(Clone)]
pub(crate) struct MetricsLayer(Option<Arc<PrometheusMetrics>>);

impl MetricsLayer {
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        Self(metrics.map(Arc::new))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let Some(metrics) = self.0.clone() else {
            let passthrough = service.map(ServiceResponse::map_into_boxed_body);
            return Box::pin(async move { Ok(boxed::service(passthrough)) });
        };
        let wrapped = Compat::new((*metrics).clone()).new_transform(service);
        Box::pin(async move { Ok(boxed::service(wrapped.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    #[test]
    fn registry_failures_disable_metrics() {
        assert!(enabled_or_warn::<&str>(Err("duplicate collector")).is_none());
    }

    #[actix_web::test]
    async fn disabled_layer_passes_requests_through() {
        let app = test::init_service(
            App::new()
                .wrap(MetricsLayer::from_option(None))
                .route("/ping", web::get().to(|| async { HttpResponse::NoContent().finish() })),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn enabled_layer_serves_the_scrape_endpoint() {
        let metrics = PrometheusMetricsBuilder::new("docket_test")
            .registry(Registry::new())
            .endpoint(METRICS_ENDPOINT)
            .build()
            .ok();
        let app = test::init_service(
            App::new()
                .wrap(MetricsLayer::from_option(metrics))
                .route("/ping", web::get().to(|| async { HttpResponse::NoContent().finish() })),
        )
        .await;
        test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri(METRICS_ENDPOINT).to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
