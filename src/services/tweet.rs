use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::tweet::Tweet,
    services::database::Database,
};

const TWEET_FIELDS: &str = "meta::id(id) AS id, user_id, content, created_at";

/// Tweet CRUD. Content validation happens at the request boundary; this
/// service only persists and guards ownership.
#[derive(Clone)]
pub struct TweetService {
    db: Arc<Database>,
}

impl TweetService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, user_id: &str, content: &str) -> Result<Tweet> {
        let tweet = Tweet {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        self.db
            .query_with_params(
                r#"
                    CREATE type::thing('tweet', $id) CONTENT {
                        user_id: $user_id,
                        content: $content,
                        created_at: <datetime> $created_at
                    } RETURN NONE
                "#,
                json!({
                    "id": &tweet.id,
                    "user_id": &tweet.user_id,
                    "content": &tweet.content,
                    "created_at": &tweet.created_at,
                }),
            )
            .await?;

        info!("User {} posted tweet {}", user_id, tweet.id);
        Ok(tweet)
    }

    pub async fn get(&self, tweet_id: &str) -> Result<Option<Tweet>> {
        let query = format!("SELECT {} FROM type::thing('tweet', $id)", TWEET_FIELDS);
        let mut response = self
            .db
            .query_with_params(&query, json!({ "id": tweet_id }))
            .await?;
        let tweets: Vec<Tweet> = response.take(0)?;
        Ok(tweets.into_iter().next())
    }

    /// All tweets, most recent first.
    pub async fn feed(&self, page: i64, limit: i64) -> Result<Vec<Tweet>> {
        debug!("Fetching tweet feed page {} (limit {})", page, limit);

        let start = (page - 1) * limit;
        let query = format!(
            "SELECT {} FROM tweet ORDER BY created_at DESC LIMIT $limit START $start",
            TWEET_FIELDS
        );
        let mut response = self
            .db
            .query_with_params(&query, json!({ "limit": limit, "start": start }))
            .await?;
        let tweets: Vec<Tweet> = response.take(0)?;
        Ok(tweets)
    }

    /// One author's tweets, most recent first.
    pub async fn list_by_author(&self, user_id: &str) -> Result<Vec<Tweet>> {
        let query = format!(
            "SELECT {} FROM tweet WHERE user_id = $user_id ORDER BY created_at DESC",
            TWEET_FIELDS
        );
        let mut response = self
            .db
            .query_with_params(&query, json!({ "user_id": user_id }))
            .await?;
        let tweets: Vec<Tweet> = response.take(0)?;
        Ok(tweets)
    }

    /// Deletes a tweet and its likes. Only the author may delete.
    pub async fn delete(&self, actor_id: &str, tweet_id: &str) -> Result<()> {
        let tweet = self
            .get(tweet_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tweet"))?;

        if tweet.user_id != actor_id {
            return Err(AppError::forbidden("Only the author can delete a tweet"));
        }

        self.db
            .query_with_params(
                r#"
                    DELETE type::thing('tweet', $id);
                    DELETE tweet_like WHERE tweet_id = $id;
                "#,
                json!({ "id": tweet_id }),
            )
            .await?;

        info!("User {} deleted tweet {}", actor_id, tweet_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> TweetService {
        let config = Config::default();
        let db = Arc::new(Database::connect(&config).await.unwrap());
        TweetService::new(db)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let tweets = service().await;
        let tweet = tweets.create("u1", "this is a test").await.unwrap();

        let found = tweets.get(&tweet.id).await.unwrap().unwrap();
        assert_eq!(found.content, "this is a test");
        assert_eq!(found.user_id, "u1");

        assert!(tweets.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let tweets = service().await;
        tweets.create("u1", "first").await.unwrap();
        tweets.create("u2", "second").await.unwrap();
        tweets.create("u1", "third").await.unwrap();

        let feed = tweets.feed(1, 20).await.unwrap();
        let contents: Vec<&str> = feed.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);

        let by_author = tweets.list_by_author("u1").await.unwrap();
        let contents: Vec<&str> = by_author.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "first"]);
    }

    #[tokio::test]
    async fn test_feed_pagination() {
        let tweets = service().await;
        for i in 0..5 {
            tweets.create("u1", &format!("tweet {}", i)).await.unwrap();
        }

        let first_page = tweets.feed(1, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);
        let second_page = tweets.feed(2, 2).await.unwrap();
        assert_eq!(second_page.len(), 2);
        assert_ne!(first_page[0].id, second_page[0].id);
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let tweets = service().await;
        let tweet = tweets.create("u1", "this is a test").await.unwrap();

        let err = tweets.delete("u2", &tweet.id).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert!(tweets.get(&tweet.id).await.unwrap().is_some());

        tweets.delete("u1", &tweet.id).await.unwrap();
        assert!(tweets.get(&tweet.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_tweet() {
        let tweets = service().await;
        let err = tweets.delete("u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
