use crate::{
    error::{AppError, Result},
    models::{
        like::LikeResponse,
        tweet::{CreateTweetRequest, TweetWithAuthor},
    },
    routes::redirect,
    state::AppState,
    utils::middleware::CurrentUser,
};
use axum::{
    extract::{Path, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_tweet))
        .route("/:id", get(tweet_detail))
        .route("/:id/delete", post(delete_tweet))
        .route("/:id/like", post(like_tweet))
        .route("/:id/unlike", post(unlike_tweet))
}

/// POST /tweets/create
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTweetRequest>,
) -> Result<Response> {
    payload.validate()?;

    state
        .tweet_service
        .create(&user.id, &payload.content)
        .await?;

    Ok(redirect("/home"))
}

/// GET /tweets/:id
async fn tweet_detail(
    State(state): State<Arc<AppState>>,
    CurrentUser(viewer): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Fetching tweet {}", id);

    let tweet = state
        .tweet_service
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet"))?;

    let author = state
        .user_service
        .get_by_id(&tweet.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let like_count = state.like_service.count(&tweet.id).await?;
    let liked = state.like_service.liked(&viewer.id, &tweet.id).await?;

    let tweet = TweetWithAuthor {
        id: tweet.id,
        user_id: tweet.user_id,
        username: author.username,
        content: tweet.content,
        created_at: tweet.created_at,
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "tweet": tweet,
            "like_count": like_count,
            "liked": liked,
        }
    })))
}

/// POST /tweets/:id/delete
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response> {
    state.tweet_service.delete(&user.id, &id).await?;
    Ok(redirect("/home"))
}

/// POST /tweets/:id/like
async fn like_tweet(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let tweet = state
        .tweet_service
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet"))?;

    let like_count = state.like_service.like(&user.id, &tweet.id).await?;

    Ok(Json(LikeResponse {
        like_count,
        tweet_pk: tweet.id,
    }))
}

/// POST /tweets/:id/unlike
async fn unlike_tweet(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let tweet = state
        .tweet_service
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet"))?;

    let like_count = state.like_service.unlike(&user.id, &tweet.id).await?;

    Ok(Json(LikeResponse {
        like_count,
        tweet_pk: tweet.id,
    }))
}
