// Shared-secret guard for the cron trigger

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::api::server::AppState;

/// Requires `Authorization: Bearer <CRON_SECRET>`.
///
/// The secret is read from [`AppState`]; when none is configured every
/// request is refused with 503 so an unconfigured deployment cannot be
/// triggered anonymously.
pub struct CronAuth;

impl<S, B> Transform<S, ServiceRequest> for CronAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = CronAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CronAuthMiddleware { service }))
    }
}

pub struct CronAuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CronAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.cron_secret.clone());

        let Some(secret) = secret else {
            tracing::warn!(path = %req.path(), "cron trigger called but CRON_SECRET is not set");
            return Box::pin(async move {
                let response = HttpResponse::ServiceUnavailable()
                    .json(serde_json::json!({
                        "success": false,
                        "error": "Cron trigger is not configured"
                    }))
                    .map_into_right_body();
                Ok(req.into_response(response))
            });
        };

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        if token.is_some_and(|t| secrets_match(t.trim(), &secret)) {
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            });
        }

        tracing::warn!(path = %req.path(), "cron trigger rejected: bad or missing token");
        Box::pin(async move {
            let response = HttpResponse::Unauthorized()
                .json(serde_json::json!({
                    "success": false,
                    "error": "Invalid or missing authentication token"
                }))
                .map_into_right_body();
            Ok(req.into_response(response))
        })
    }
}

/// Byte comparison whose running time does not depend on where the inputs differ.
fn secrets_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
