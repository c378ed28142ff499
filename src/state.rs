use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        auth::AuthService, database::Database, follow::FollowService, like::LikeService,
        tweet::TweetService, user::UserService,
    },
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,

    /// Database connection
    pub db: Arc<Database>,

    /// Session and credential service
    pub auth_service: AuthService,

    /// Account service
    pub user_service: UserService,

    /// Tweet service
    pub tweet_service: TweetService,

    /// Follow service
    pub follow_service: FollowService,

    /// Like service
    pub like_service: LikeService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>) -> Self {
        let auth_service = AuthService::new(&config);
        let user_service = UserService::new(db.clone(), auth_service.clone());
        let tweet_service = TweetService::new(db.clone());
        let follow_service = FollowService::new(db.clone());
        let like_service = LikeService::new(db.clone());

        Self {
            config,
            db,
            auth_service,
            user_service,
            tweet_service,
            follow_service,
            like_service,
        }
    }

    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
