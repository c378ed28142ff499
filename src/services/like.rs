use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::Result,
    models::like::Like,
    services::database::{is_unique_index_violation, Database},
};

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct TweetIdRow {
    tweet_id: String,
}

/// Like bookkeeping with get-or-create semantics: repeated likes and unlikes
/// of the same tweet are no-ops, never errors.
#[derive(Clone)]
pub struct LikeService {
    db: Arc<Database>,
}

impl LikeService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Records a like if none exists and returns the tweet's like count.
    pub async fn like(&self, user_id: &str, tweet_id: &str) -> Result<i64> {
        debug!("User {} liking tweet {}", user_id, tweet_id);

        if !self.liked(user_id, tweet_id).await? {
            let like = Like {
                id: Uuid::new_v4().to_string(),
                tweet_id: tweet_id.to_string(),
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            };
            let created = self
                .db
                .query_with_params(
                    r#"
                        CREATE type::thing('tweet_like', $id) CONTENT {
                            tweet_id: $tweet_id,
                            user_id: $user_id,
                            created_at: <datetime> $created_at
                        } RETURN NONE
                    "#,
                    json!({
                        "id": &like.id,
                        "tweet_id": &like.tweet_id,
                        "user_id": &like.user_id,
                        "created_at": &like.created_at,
                    }),
                )
                .await;

            if let Err(e) = created {
                // A concurrent like already inserted the row; that is the
                // outcome we wanted.
                if !is_unique_index_violation(&e) {
                    return Err(e);
                }
            }
        }

        self.count(tweet_id).await
    }

    /// Removes a like if present and returns the tweet's like count.
    pub async fn unlike(&self, user_id: &str, tweet_id: &str) -> Result<i64> {
        debug!("User {} unliking tweet {}", user_id, tweet_id);

        self.db
            .query_with_params(
                "DELETE tweet_like WHERE tweet_id = $tweet_id AND user_id = $user_id",
                json!({ "tweet_id": tweet_id, "user_id": user_id }),
            )
            .await?;

        self.count(tweet_id).await
    }

    pub async fn count(&self, tweet_id: &str) -> Result<i64> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT count() AS count FROM tweet_like WHERE tweet_id = $tweet_id GROUP ALL",
                json!({ "tweet_id": tweet_id }),
            )
            .await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.count).unwrap_or(0))
    }

    pub async fn liked(&self, user_id: &str, tweet_id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT meta::id(id) AS id FROM tweet_like
                    WHERE tweet_id = $tweet_id
                    AND user_id = $user_id
                    LIMIT 1
                "#,
                json!({ "tweet_id": tweet_id, "user_id": user_id }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }

    /// Ids of every tweet the user has liked, for marking feeds.
    pub async fn liked_tweet_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT tweet_id FROM tweet_like WHERE user_id = $user_id",
                json!({ "user_id": user_id }),
            )
            .await?;
        let rows: Vec<TweetIdRow> = response.take(0)?;
        Ok(rows.into_iter().map(|row| row.tweet_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> LikeService {
        let config = Config::default();
        let db = Arc::new(Database::connect(&config).await.unwrap());
        LikeService::new(db)
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let likes = service().await;

        assert_eq!(likes.like("u1", "t1").await.unwrap(), 1);
        assert_eq!(likes.like("u1", "t1").await.unwrap(), 1);
        assert!(likes.liked("u1", "t1").await.unwrap());

        assert_eq!(likes.like("u2", "t1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unlike_is_idempotent() {
        let likes = service().await;

        likes.like("u1", "t1").await.unwrap();
        assert_eq!(likes.unlike("u1", "t1").await.unwrap(), 0);
        assert_eq!(likes.unlike("u1", "t1").await.unwrap(), 0);
        assert!(!likes.liked("u1", "t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_liked_tweet_ids() {
        let likes = service().await;

        likes.like("u1", "t1").await.unwrap();
        likes.like("u1", "t2").await.unwrap();
        likes.like("u2", "t3").await.unwrap();

        let mut liked = likes.liked_tweet_ids("u1").await.unwrap();
        liked.sort();
        assert_eq!(liked, vec!["t1".to_string(), "t2".to_string()]);
    }
}
