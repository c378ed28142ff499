use serde::Serialize;
use surrealdb::{
    engine::any::{connect, Any},
    opt::auth::Root,
    Response, Surreal,
};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Tables and the uniqueness constraints the application relies on. The
/// indexes back-stop races the handler-level checks cannot see.
const SCHEMA: &str = r#"
    DEFINE TABLE user SCHEMALESS;
    DEFINE INDEX user_username_unique ON TABLE user COLUMNS username UNIQUE;
    DEFINE INDEX user_email_unique ON TABLE user COLUMNS email UNIQUE;
    DEFINE TABLE friendship SCHEMALESS;
    DEFINE INDEX friendship_pair_unique ON TABLE friendship COLUMNS follower_id, following_id UNIQUE;
    DEFINE TABLE tweet SCHEMALESS;
    DEFINE TABLE tweet_like SCHEMALESS;
    DEFINE INDEX tweet_like_pair_unique ON TABLE tweet_like COLUMNS tweet_id, user_id UNIQUE;
"#;

/// Database service wrapping the SurrealDB client.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
}

impl Database {
    /// Connects to the endpoint named in the configuration (`http://` in
    /// deployment, `mem://` in tests) and defines the schema.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = connect(config.database_url.as_str()).await?;

        // The embedded engine has no authentication layer.
        if !config.database_url.starts_with("mem") {
            client
                .signin(Root {
                    username: config.database_username.as_str(),
                    password: config.database_password.as_str(),
                })
                .await?;
        }

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        let db = Self { client };
        db.define_schema().await?;
        Ok(db)
    }

    /// Verifies the connection with a no-op query.
    pub async fn verify_connection(&self) -> Result<()> {
        match self.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e)
            }
        }
    }

    async fn define_schema(&self) -> Result<()> {
        self.query(SCHEMA).await?;
        Ok(())
    }

    /// Executes a raw query.
    pub async fn query(&self, sql: &str) -> Result<Response> {
        let response = self.client.query(sql).await?;
        response.check().map_err(AppError::from)
    }

    /// Executes a query binding each key of `params` as a variable.
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        let response = self.client.query(sql).bind(params).await?;
        response.check().map_err(AppError::from)
    }
}

/// True when an error is the store rejecting a duplicate row through one of
/// the UNIQUE indexes above.
pub fn is_unique_index_violation(err: &AppError) -> bool {
    matches!(err, AppError::Database(e) if e.to_string().contains("already contains"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::connect(&config).await;
        assert!(db.is_ok());
        assert!(db.unwrap().verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_definition_is_idempotent() {
        let config = Config::default();
        let db = Database::connect(&config).await.unwrap();
        assert!(db.define_schema().await.is_ok());
    }
}
