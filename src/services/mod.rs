pub mod auth;
pub mod database;
pub mod follow;
pub mod like;
pub mod tweet;
pub mod user;

pub use auth::AuthService;
pub use database::Database;
pub use follow::FollowService;
pub use like::LikeService;
pub use tweet::TweetService;
pub use user::UserService;
