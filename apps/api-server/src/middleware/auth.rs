//! Authentication extractors.
//!
//! Login-required endpoints take an [`Identity`] parameter; requests
//! without a valid token are answered with a redirect to the login
//! page carrying the original destination in `next`.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header};
use std::future::{Ready, ready};
use std::sync::Arc;

use murmur_core::ports::{TokenClaims, TokenService};

/// Path of the login page used in redirects.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Name of the cookie carrying the auth token for browser flows.
pub const AUTH_COOKIE: &str = "auth";

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Failed authentication: answered as a redirect to the login page,
/// preserving the requested path in the `next` query parameter.
#[derive(Debug)]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    fn for_request(req: &HttpRequest) -> Self {
        Self {
            next: req.path().to_string(),
        }
    }
}

impl std::fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "authentication required for {}", self.next)
    }
}

impl actix_web::ResponseError for LoginRedirect {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::FOUND
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::Found()
            .insert_header((
                header::LOCATION,
                format!("{LOGIN_PATH}?next={}", self.next),
            ))
            .finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let auth_str = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(str::to_string)
}

fn cookie_token(req: &HttpRequest) -> Option<String> {
    req.cookie(AUTH_COOKIE).map(|c| c.value().to_string())
}

impl FromRequest for Identity {
    type Error = LoginRedirect;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token_service = match req.app_data::<actix_web::web::Data<Arc<dyn TokenService>>>() {
            Some(service) => service,
            None => {
                tracing::error!("TokenService not found in app data");
                return ready(Err(LoginRedirect::for_request(req)));
            }
        };

        let token = match bearer_token(req).or_else(|| cookie_token(req)) {
            Some(t) => t,
            None => return ready(Err(LoginRedirect::for_request(req))),
        };

        match token_service.validate_token(&token) {
            Ok(claims) => ready(Ok(Identity::from(claims))),
            Err(e) => {
                tracing::debug!("Rejecting credentials: {}", e);
                ready(Err(LoginRedirect::for_request(req)))
            }
        }
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        match Identity::from_request(req, payload).into_inner() {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(_) => ready(Ok(OptionalIdentity(None))),
        }
    }
}
