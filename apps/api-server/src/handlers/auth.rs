//! Signup, login, and logout handlers.

use std::sync::Arc;

use actix_web::cookie::{Cookie, time};
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use murmur_core::domain::User;
use murmur_core::error::RepoError;
use murmur_core::ports::{PasswordService, TokenService};
use murmur_shared::dto::{LoginFormView, SignupFormView};
use murmur_shared::forms::{FieldError, LoginFormData, SignupFormData};

use crate::middleware::auth::AUTH_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::redirect;

#[derive(Debug, Deserialize)]
pub(crate) struct NextQuery {
    next: Option<String>,
}

/// GET /auth/signup/
pub async fn signup_form() -> HttpResponse {
    HttpResponse::Ok().json(SignupFormView::default())
}

fn signup_view(data: &SignupFormData, errors: Vec<FieldError>) -> SignupFormView {
    SignupFormView {
        username: data.username.clone(),
        email: data.email.clone(),
        first_name: data.first_name.clone(),
        last_name: data.last_name.clone(),
        errors,
    }
}

/// POST /auth/signup/
///
/// Valid submissions create the account and land on the global feed;
/// invalid ones re-render the form with field errors.
pub async fn signup(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<SignupFormData>,
) -> AppResult<HttpResponse> {
    let data = form.into_inner();
    let valid = match data.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(HttpResponse::Ok().json(signup_view(&data, errors))),
    };

    let taken = FieldError::new("username", "A user with that username already exists.");
    if state.users.find_by_username(&valid.username).await?.is_some() {
        return Ok(HttpResponse::Ok().json(signup_view(&data, vec![taken])));
    }

    let password_hash = password_service
        .hash(&valid.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(
        valid.username,
        valid.email,
        valid.first_name,
        valid.last_name,
        password_hash,
    );

    match state.users.create(user).await {
        Ok(user) => {
            tracing::info!(username = %user.username, "User registered");
            Ok(redirect("/"))
        }
        // Concurrent signup with the same username.
        Err(RepoError::Constraint(_)) => {
            Ok(HttpResponse::Ok().json(signup_view(&data, vec![taken])))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginFormView {
        next: query.into_inner().next,
        errors: Vec::new(),
    })
}

/// POST /auth/login/
///
/// On success sets the auth cookie and redirects to `next` (or the
/// global feed). Credentials are checked against the stored hash.
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<LoginFormData>,
) -> AppResult<HttpResponse> {
    let data = form.into_inner();

    let rejected = || {
        HttpResponse::Ok().json(LoginFormView {
            next: data.next.clone(),
            errors: vec![FieldError::new(
                "__all__",
                "Please enter a correct username and password.",
            )],
        })
    };

    let Some(user) = state.users.find_by_username(&data.username).await? else {
        return Ok(rejected());
    };

    let valid = password_service
        .verify(&data.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Ok(rejected());
    }

    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let cookie = Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(token_service.expiration_seconds()))
        .finish();

    let destination = data.next.filter(|n| n.starts_with('/')).unwrap_or_else(|| "/".to_string());

    tracing::info!(username = %user.username, "User logged in");
    Ok(HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, destination))
        .cookie(cookie)
        .finish())
}

/// GET /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);

    HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "detail": "Logged out." }))
}
