use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::Result,
    models::follow::{FollowOutcome, FriendShip},
    services::database::{is_unique_index_violation, Database},
};

const FRIENDSHIP_FIELDS: &str =
    "meta::id(id) AS id, follower_id, following_id, created_date";

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

/// Follow-edge service. Refused follows come back as outcomes, not errors,
/// because the callers surface them as warnings.
#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn follow(&self, follower_id: &str, following_id: &str) -> Result<FollowOutcome> {
        debug!("User {} following user {}", follower_id, following_id);

        if follower_id == following_id {
            return Ok(FollowOutcome::SelfFollow);
        }

        if self.is_following(follower_id, following_id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let created = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('friendship', $id) CONTENT {
                        follower_id: $follower_id,
                        following_id: $following_id,
                        created_date: <datetime> $created_date
                    } RETURN NONE
                "#,
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "follower_id": follower_id,
                    "following_id": following_id,
                    "created_date": Utc::now(),
                }),
            )
            .await;

        match created {
            Ok(_) => {
                info!("User {} followed user {}", follower_id, following_id);
                Ok(FollowOutcome::Followed)
            }
            // A concurrent follow beat us to the unique index.
            Err(ref e) if is_unique_index_violation(e) => Ok(FollowOutcome::AlreadyFollowing),
            Err(e) => Err(e),
        }
    }

    /// Removes the follow edge. Returns whether a row was actually deleted.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        debug!("User {} unfollowing user {}", follower_id, following_id);

        let mut response = self
            .db
            .query_with_params(
                r#"
                    DELETE friendship
                    WHERE follower_id = $follower_id
                    AND following_id = $following_id
                    RETURN BEFORE
                "#,
                json!({
                    "follower_id": follower_id,
                    "following_id": following_id,
                }),
            )
            .await?;
        let deleted: Vec<Value> = response.take(0)?;

        Ok(!deleted.is_empty())
    }

    /// Edges where the named user is the follower, newest first.
    pub async fn following_of(&self, user_id: &str, page: i64, limit: i64) -> Result<Vec<FriendShip>> {
        self.list_where("follower_id", user_id, page, limit).await
    }

    /// Edges where the named user is being followed, newest first.
    pub async fn followers_of(&self, user_id: &str, page: i64, limit: i64) -> Result<Vec<FriendShip>> {
        self.list_where("following_id", user_id, page, limit).await
    }

    async fn list_where(
        &self,
        column: &str,
        user_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<Vec<FriendShip>> {
        let start = (page - 1) * limit;
        let query = format!(
            "SELECT {} FROM friendship WHERE {} = $user_id ORDER BY created_date DESC LIMIT $limit START $start",
            FRIENDSHIP_FIELDS, column
        );
        let mut response = self
            .db
            .query_with_params(
                &query,
                json!({ "user_id": user_id, "limit": limit, "start": start }),
            )
            .await?;
        let friendships: Vec<FriendShip> = response.take(0)?;
        Ok(friendships)
    }

    pub async fn following_count(&self, user_id: &str) -> Result<i64> {
        self.count_where("follower_id", user_id).await
    }

    pub async fn follower_count(&self, user_id: &str) -> Result<i64> {
        self.count_where("following_id", user_id).await
    }

    async fn count_where(&self, column: &str, user_id: &str) -> Result<i64> {
        let query = format!(
            "SELECT count() AS count FROM friendship WHERE {} = $user_id GROUP ALL",
            column
        );
        let mut response = self
            .db
            .query_with_params(&query, json!({ "user_id": user_id }))
            .await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.count).unwrap_or(0))
    }

    pub async fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT meta::id(id) AS id FROM friendship
                    WHERE follower_id = $follower_id
                    AND following_id = $following_id
                    LIMIT 1
                "#,
                json!({
                    "follower_id": follower_id,
                    "following_id": following_id,
                }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> FollowService {
        let config = Config::default();
        let db = Arc::new(Database::connect(&config).await.unwrap());
        FollowService::new(db)
    }

    #[tokio::test]
    async fn test_follow_creates_single_edge() {
        let follows = service().await;

        assert_eq!(
            follows.follow("u1", "u2").await.unwrap(),
            FollowOutcome::Followed
        );
        assert_eq!(
            follows.follow("u1", "u2").await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );

        assert_eq!(follows.following_count("u1").await.unwrap(), 1);
        assert_eq!(follows.follower_count("u2").await.unwrap(), 1);
        assert!(follows.is_following("u1", "u2").await.unwrap());
        assert!(!follows.is_following("u2", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_refused() {
        let follows = service().await;

        assert_eq!(
            follows.follow("u1", "u1").await.unwrap(),
            FollowOutcome::SelfFollow
        );
        assert_eq!(follows.following_count("u1").await.unwrap(), 0);
        assert_eq!(follows.follower_count("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unfollow_roundtrip() {
        let follows = service().await;

        follows.follow("u1", "u2").await.unwrap();
        assert!(follows.unfollow("u1", "u2").await.unwrap());
        assert_eq!(follows.follower_count("u2").await.unwrap(), 0);

        // Nothing left to delete
        assert!(!follows.unfollow("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let follows = service().await;

        follows.follow("u1", "u2").await.unwrap();
        follows.follow("u1", "u3").await.unwrap();
        follows.follow("u4", "u1").await.unwrap();

        let following = follows.following_of("u1", 1, 20).await.unwrap();
        assert_eq!(following.len(), 2);
        assert!(following[0].created_date >= following[1].created_date);
        assert_eq!(following[0].following_id, "u3");

        let followers = follows.followers_of("u1", 1, 20).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].follower_id, "u4");

        let first = follows.following_of("u1", 1, 1).await.unwrap();
        let second = follows.following_of("u1", 2, 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].following_id, second[0].following_id);
    }
}
