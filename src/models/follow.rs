use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;

/// A directed follow edge: follower -> following.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendShip {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_date: DateTime<Utc>,
}

/// One row of a following/follower list, joined to the related account.
#[derive(Debug, Clone, Serialize)]
pub struct FollowListEntry {
    pub user: UserSummary,
    pub created_date: DateTime<Utc>,
}

/// Result of a follow attempt. Refusals are warnings, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollow,
}
