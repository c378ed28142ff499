use crate::{
    error::{AppError, Result},
    models::user::{LoginRequest, SignupRequest},
    routes::redirect_with_cookie,
    state::AppState,
};
use axum::{
    extract::State,
    response::Response,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::ValidationErrors;

use crate::utils::validation::{field_error, REQUIRED_FIELD};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Response> {
    debug!("Signup attempt for username: {}", payload.username);

    let user = state.user_service.signup(&payload).await?;
    let token = state.auth_service.issue_token(&user.id)?;

    info!("Signed up and logged in user {} ({})", user.username, user.id);
    Ok(redirect_with_cookie(
        "/home",
        state.auth_service.session_cookie(&token),
    ))
}

/// POST /login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    debug!("Login attempt for username: {}", payload.username);

    let mut errors = ValidationErrors::new();
    if payload.username.is_empty() {
        errors.add("username", field_error("required", REQUIRED_FIELD));
    }
    if payload.password.is_empty() {
        errors.add("password", field_error("required", REQUIRED_FIELD));
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    match state
        .user_service
        .authenticate(&payload.username, &payload.password)
        .await?
    {
        Some(user) => {
            let token = state.auth_service.issue_token(&user.id)?;
            info!("Logged in user {} ({})", user.username, user.id);
            Ok(redirect_with_cookie(
                "/home",
                state.auth_service.session_cookie(&token),
            ))
        }
        None => Err(AppError::unauthorized(
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        )),
    }
}

/// POST /logout
///
/// The session lives entirely in the cookie, so teardown is clearing it.
async fn logout(State(state): State<Arc<AppState>>) -> Response {
    debug!("Logout");
    redirect_with_cookie("/login", state.auth_service.clear_session_cookie())
}
