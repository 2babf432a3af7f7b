//! Rate limiting middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};

use inkwell_core::ports::RateLimiter;
use inkwell_shared::ErrorResponse;

use super::auth::bearer_token;
use crate::state::AppState;

/// Rate limiting middleware factory. A `None` limiter lets everything through.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Option<Arc<dyn RateLimiter>>,
}

/// Authenticated callers are limited per user, everyone else per client IP.
fn client_key(req: &ServiceRequest) -> String {
    let user = req.app_data::<web::Data<AppState>>().and_then(|state| {
        bearer_token(req.request())
            .ok()
            .and_then(|token| state.tokens.validate_token(token).ok())
    });

    match user {
        Some(claims) => format!("user:{}", claims.user_id),
        None => format!(
            "ip:{}",
            req.connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
        ),
    }
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            if let Some(limiter) = limiter {
                let key = client_key(&req);

                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        let retry_after = result.retry_after.as_secs().max(1);
                        tracing::warn!(key = %key, retry_after, "Rate limit exceeded");

                        let response = HttpResponse::TooManyRequests()
                            .insert_header(("Retry-After", retry_after.to_string()))
                            .json(ErrorResponse::new(
                                "Too many AI requests, please try again later",
                            ));

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    // Fail open.
                    Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
