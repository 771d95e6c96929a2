use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use async_trait::async_trait;
use futures_util::future::{ok, ready, Ready};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AuthenticatedUser, TokenClass};
use crate::services::auth::tokens::{self, TokenError};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// User-persistence collaborator consumed by the authentication gate: resolves
/// a verified subject id to its current profile, or nothing for a deleted
/// account.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthenticatedUser>, AppError>;
}

/// Ordered token extraction: cookie first, then `Authorization: Bearer`.
/// The first source present wins, never both.
fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let header = req.headers().get(AUTHORIZATION)?;
    let header_str = header.to_str().ok()?;
    let token = header_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Per-request authentication gate.
///
/// Verifies the access token, resolves the subject's current profile through
/// the user-lookup collaborator, and attaches the resulting identity to the
/// request. Every failure mode surfaces as the same 401; access tokens are
/// never re-issued here.
#[derive(Clone)]
pub struct AuthenticationGate {
    users: Arc<dyn UserLookup>,
}

impl AuthenticationGate {
    pub fn new(users: Arc<dyn UserLookup>) -> Self {
        Self { users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationGateMiddleware {
            service: Arc::new(service),
            users: self.users.clone(),
        })
    }
}

pub struct AuthenticationGateMiddleware<S> {
    service: Arc<S>,
    users: Arc<dyn UserLookup>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        // Skip auth check for OPTIONS requests (CORS pre-flight)
        if req.method() == actix_web::http::Method::OPTIONS {
            return Box::pin(service.call(req));
        }

        let path = req.path().to_string();

        let token = match extract_access_token(&req) {
            Some(token) => token,
            None => {
                warn!("No access token presented for path: {}", path);
                return Box::pin(ready(Err(Error::from(AppError::Unauthenticated(
                    "Missing access token".to_string(),
                )))));
            }
        };

        let users = self.users.clone();

        Box::pin(async move {
            let verified = tokens::verify(&token, TokenClass::Access).map_err(|err| match err {
                TokenError::Unavailable => {
                    Error::from(AppError::Configuration("Token keys not initialized".to_string()))
                }
                other => {
                    warn!("Access token rejected for path {}: {}", path, other);
                    Error::from(AppError::Unauthenticated(other.to_string()))
                }
            })?;

            let user = users
                .find_user_by_id(verified.subject)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| {
                    warn!(
                        "Access token subject {} no longer exists (path: {})",
                        verified.subject, path
                    );
                    Error::from(AppError::Unauthenticated("Unknown subject".to_string()))
                })?;

            debug!("Authenticated subject {} for path {}", user.user_id, path);
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::tokens::init_test_keys;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};
    use chrono::Utc;
    use dashmap::DashMap;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    /// Materialize the response exactly as the running server would.
    ///
    /// A gate that short-circuits with `Err` has that error rendered to an
    /// HTTP response by actix's `ResponseError` infrastructure at the server
    /// boundary. `test::call_service` instead unwraps the `Err` and panics, so
    /// the error-path cases route through this wrapper to observe the rendered
    /// status a client would actually receive.
    async fn call_rendering_errors<S, R, B>(app: &S, req: R) -> HttpResponse
    where
        S: Service<R, Response = ServiceResponse<B>, Error = Error>,
        B: actix_web::body::MessageBody + 'static,
    {
        match test::try_call_service(app, req).await {
            Ok(res) => res.into_parts().1.map_into_boxed_body(),
            Err(err) => err.error_response(),
        }
    }

    #[derive(Default)]
    struct StubUsers {
        users: DashMap<Uuid, AuthenticatedUser>,
    }

    impl StubUsers {
        fn with_user(user_id: Uuid) -> Arc<Self> {
            let stub = Self::default();
            stub.users.insert(
                user_id,
                AuthenticatedUser {
                    user_id,
                    username: "tester".to_string(),
                    email: "tester@example.com".to_string(),
                    full_name: None,
                },
            );
            Arc::new(stub)
        }
    }

    #[async_trait]
    impl UserLookup for StubUsers {
        async fn find_user_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<AuthenticatedUser>, AppError> {
            Ok(self.users.get(&id).map(|u| u.value().clone()))
        }
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({ "id": user.user_id }))
    }

    macro_rules! gate_app {
        ($users:expr) => {
            test::init_service(
                App::new()
                    .wrap(AuthenticationGate::new($users))
                    .route("/me", web::get().to(whoami)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_missing_token_is_rejected() {
        init_test_keys();
        let app = gate_app!(StubUsers::with_user(Uuid::new_v4()));

        let req = test::TestRequest::get().uri("/me").to_request();
        let res = call_rendering_errors(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_garbage_token_is_rejected() {
        init_test_keys();
        let app = gate_app!(StubUsers::with_user(Uuid::new_v4()));

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer not-a-token"))
            .to_request();
        let res = call_rendering_errors(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_bearer_token_passes() {
        init_test_keys();
        let user_id = Uuid::new_v4();
        let app = gate_app!(StubUsers::with_user(user_id));

        let token = tokens::mint(user_id, TokenClass::Access).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_valid_cookie_token_passes() {
        init_test_keys();
        let user_id = Uuid::new_v4();
        let app = gate_app!(StubUsers::with_user(user_id));

        let token = tokens::mint(user_id, TokenClass::Access).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(actix_web::cookie::Cookie::new(ACCESS_TOKEN_COOKIE, token))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_cookie_takes_precedence_over_header() {
        init_test_keys();
        let user_id = Uuid::new_v4();
        let app = gate_app!(StubUsers::with_user(user_id));

        // Valid cookie, garbage header: the cookie must win.
        let token = tokens::mint(user_id, TokenClass::Access).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(actix_web::cookie::Cookie::new(ACCESS_TOKEN_COOKIE, token))
            .insert_header((AUTHORIZATION, "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_an_access_token() {
        init_test_keys();
        let user_id = Uuid::new_v4();
        let app = gate_app!(StubUsers::with_user(user_id));

        let token = tokens::mint(user_id, TokenClass::Refresh).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let res = call_rendering_errors(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_expired_token_is_rejected() {
        init_test_keys();
        let user_id = Uuid::new_v4();
        let app = gate_app!(StubUsers::with_user(user_id));

        // Hand-roll a well-formed but already-expired access token with the
        // test signing secret.
        let now = Utc::now().timestamp();
        let claims = crate::models::Claims {
            sub: user_id.to_string(),
            exp: (now - 60) as usize,
            iat: (now - 960) as usize,
            iss: tokens::TOKEN_ISSUER.to_string(),
            cls: TokenClass::Access,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-access-secret"),
        )
        .unwrap();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let res = call_rendering_errors(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_deleted_subject_is_rejected() {
        init_test_keys();
        let app = gate_app!(Arc::new(StubUsers::default()));

        let token = tokens::mint(Uuid::new_v4(), TokenClass::Access).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let res = call_rendering_errors(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
