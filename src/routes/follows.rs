use crate::{
    error::{AppError, Result},
    models::follow::FollowOutcome,
    routes::{redirect, warning},
    state::AppState,
    utils::middleware::CurrentUser,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::post,
    Router,
};
use std::sync::Arc;
use tracing::{debug, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:username/follow", post(follow_user))
        .route("/:username/unfollow", post(unfollow_user))
}

/// POST /:username/follow
async fn follow_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} following {}", user.username, username);

    let target = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    match state.follow_service.follow(&user.id, &target.id).await? {
        FollowOutcome::Followed => {
            info!("User {} now follows {}", user.username, target.username);
            Ok(redirect("/home"))
        }
        FollowOutcome::SelfFollow => Ok(warning("You cannot follow yourself.")),
        FollowOutcome::AlreadyFollowing => Ok(warning("You are already following this user.")),
    }
}

/// POST /:username/unfollow
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} unfollowing {}", user.username, username);

    let target = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if state.follow_service.unfollow(&user.id, &target.id).await? {
        info!("User {} unfollowed {}", user.username, target.username);
        Ok(redirect("/home"))
    } else {
        Ok(warning("Invalid operation."))
    }
}
