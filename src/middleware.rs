use std::future::{ready, Ready as StdReady};
use std::rc::Rc;

use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ok, LocalBoxFuture, Ready};

use crate::auth::{verify_token, SESSION_COOKIE};
use crate::error::AppError;
use crate::models::UserProfile;
use crate::AppState;

/// Resolves the session token to a user and stores the profile in the
/// request extensions. Requests without a valid session never reach the
/// wrapped service.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareMiddleware<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(profile) => {
                    req.extensions_mut().insert(profile);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<UserProfile, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state missing".to_string()))?;

    let token = extract_token(req).ok_or_else(AppError::unauthorized)?;
    let claims = verify_token(&state.auth, &token)?;

    state
        .users
        .find_profile(&claims.sub)
        .await?
        .ok_or_else(AppError::unauthorized)
}

/// Cookie first, then `Authorization: Bearer <token>`.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// The authenticated user, as attached by [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not authorized to access this resource".to_string()))
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserProfile>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(AppError::unauthorized),
        )
    }
}
