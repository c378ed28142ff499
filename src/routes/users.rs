use crate::{
    error::{AppError, Result},
    models::{
        follow::{FollowListEntry, FriendShip},
        tweet::{Tweet, TweetWithAuthor},
        user::{User, UserSummary},
    },
    state::AppState,
    utils::middleware::CurrentUser,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/home", get(home))
        .route("/profile/:user_id", get(profile))
        .route("/:username/following_list", get(following_list))
        .route("/:username/follower_list", get(follower_list))
}

/// GET /home
///
/// Every tweet, newest first, plus the ids of tweets the viewer has liked.
async fn home(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    debug!("Fetching home feed for user: {}", user.id);

    let (page, limit) = page_bounds(&state, &query);
    let tweets = state.tweet_service.feed(page, limit).await?;
    let tweets = with_authors(&state, tweets).await?;
    let liked_list = state.like_service.liked_tweet_ids(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "tweets": tweets,
            "liked_list": liked_list,
            "page": page,
            "limit": limit,
        }
    })))
}

/// GET /profile/:user_id
///
/// The profile user's tweets plus follow counts and whether the viewer
/// follows them.
async fn profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(viewer): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Fetching profile {} for viewer {}", user_id, viewer.id);

    let profile_user = state
        .user_service
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let tweets: Vec<TweetWithAuthor> = state
        .tweet_service
        .list_by_author(&profile_user.id)
        .await?
        .into_iter()
        .map(|tweet| tweet_with_author(tweet, &profile_user))
        .collect();

    let followings_num = state.follow_service.following_count(&profile_user.id).await?;
    let followers_num = state.follow_service.follower_count(&profile_user.id).await?;
    let connected = state
        .follow_service
        .is_following(&viewer.id, &profile_user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "profile": UserSummary::from(&profile_user),
            "joined_at": profile_user.created_at,
            "tweets": tweets,
            "followings_num": followings_num,
            "followers_num": followers_num,
            "connected": connected,
        }
    })))
}

/// GET /:username/following_list
async fn following_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_viewer): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    debug!("Fetching following list of {}", username);

    let owner = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let (page, limit) = page_bounds(&state, &query);
    let friendships = state
        .follow_service
        .following_of(&owner.id, page, limit)
        .await?;
    let entries = join_users(&state, friendships, |f| f.following_id.clone()).await?;

    Ok(Json(json!({
        "success": true,
        "data": entries
    })))
}

/// GET /:username/follower_list
async fn follower_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_viewer): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    debug!("Fetching follower list of {}", username);

    let owner = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let (page, limit) = page_bounds(&state, &query);
    let friendships = state
        .follow_service
        .followers_of(&owner.id, page, limit)
        .await?;
    let entries = join_users(&state, friendships, |f| f.follower_id.clone()).await?;

    Ok(Json(json!({
        "success": true,
        "data": entries
    })))
}

fn page_bounds(state: &Arc<AppState>, query: &PageQuery) -> (i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.default_page_size)
        .clamp(1, 100);
    (page, limit)
}

fn tweet_with_author(tweet: Tweet, author: &User) -> TweetWithAuthor {
    TweetWithAuthor {
        id: tweet.id,
        user_id: tweet.user_id,
        username: author.username.clone(),
        content: tweet.content,
        created_at: tweet.created_at,
    }
}

/// Resolves tweet author ids to usernames in one batch.
async fn with_authors(
    state: &Arc<AppState>,
    tweets: Vec<Tweet>,
) -> Result<Vec<TweetWithAuthor>> {
    let mut author_ids: Vec<String> = tweets.iter().map(|t| t.user_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors = state.user_service.get_by_ids(&author_ids).await?;
    let by_id: HashMap<&str, &User> = authors.iter().map(|u| (u.id.as_str(), u)).collect();

    Ok(tweets
        .into_iter()
        .filter_map(|tweet| {
            by_id
                .get(tweet.user_id.as_str())
                .map(|author| tweet_with_author(tweet, author))
        })
        .collect())
}

/// Joins friendship rows to the account each one points at, preserving the
/// newest-first order of the input.
async fn join_users(
    state: &Arc<AppState>,
    friendships: Vec<FriendShip>,
    related_id: impl Fn(&FriendShip) -> String,
) -> Result<Vec<FollowListEntry>> {
    let mut ids: Vec<String> = friendships.iter().map(&related_id).collect();
    ids.sort();
    ids.dedup();

    let users = state.user_service.get_by_ids(&ids).await?;
    let by_id: HashMap<&str, &User> = users.iter().map(|u| (u.id.as_str(), u)).collect();

    Ok(friendships
        .iter()
        .filter_map(|friendship| {
            by_id.get(related_id(friendship).as_str()).map(|user| FollowListEntry {
                user: UserSummary::from(*user),
                created_date: friendship.created_date,
            })
        })
        .collect())
}
