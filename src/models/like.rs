use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub tweet_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Payload returned by the like/unlike endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct LikeResponse {
    pub like_count: i64,
    pub tweet_pk: String,
}
