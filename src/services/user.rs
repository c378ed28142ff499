use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    error::{AppError, Result},
    models::user::{SignupRequest, User},
    services::{
        auth::AuthService,
        database::{is_unique_index_violation, Database},
    },
    utils::validation::{
        field_error, is_valid_email, password_errors, username_format_error, REQUIRED_FIELD,
    },
};

const USER_FIELDS: &str = "meta::id(id) AS id, username, email, password_hash, created_at";

/// Account service: signup validation, credential checks, lookups.
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    auth: AuthService,
}

impl UserService {
    pub fn new(db: Arc<Database>, auth: AuthService) -> Self {
        Self { db, auth }
    }

    /// Validates a signup payload and creates the account. Failures are
    /// reported per-field so the client can surface them next to the inputs.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User> {
        let username = request.username.trim();
        let email = request.email.trim();

        let mut errors = ValidationErrors::new();

        if username.is_empty() {
            errors.add("username", field_error("required", REQUIRED_FIELD));
        } else if let Some(message) = username_format_error(username) {
            errors.add("username", field_error("invalid", &message));
        }

        if email.is_empty() {
            errors.add("email", field_error("required", REQUIRED_FIELD));
        } else if !is_valid_email(email) {
            errors.add("email", field_error("invalid", "Enter a valid email address."));
        }

        if request.password1.is_empty() {
            errors.add("password1", field_error("required", REQUIRED_FIELD));
        }
        if request.password2.is_empty() {
            errors.add("password2", field_error("required", REQUIRED_FIELD));
        } else if !request.password1.is_empty() && request.password1 != request.password2 {
            errors.add(
                "password2",
                field_error("password_mismatch", "The two password fields didn't match."),
            );
        } else if !request.password1.is_empty() {
            // The policy reports against the confirmation field.
            for message in password_errors(&request.password1, username, email) {
                errors.add("password2", field_error("invalid_password", &message));
            }
        }

        if errors.is_empty() {
            if self.is_username_taken(username).await? {
                errors.add(
                    "username",
                    field_error("unique", "A user with that username already exists."),
                );
            }
            if self.is_email_taken(email).await? {
                errors.add(
                    "email",
                    field_error("unique", "A user with that email address already exists."),
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: self.auth.hash_password(&request.password1)?,
            created_at: Utc::now(),
        };

        let created = self
            .db
            .query_with_params(
                r#"
                    CREATE type::thing('user', $id) CONTENT {
                        username: $username,
                        email: $email,
                        password_hash: $password_hash,
                        created_at: <datetime> $created_at
                    } RETURN NONE
                "#,
                json!({
                    "id": &user.id,
                    "username": &user.username,
                    "email": &user.email,
                    "password_hash": &user.password_hash,
                    "created_at": &user.created_at,
                }),
            )
            .await;

        match created {
            Ok(_) => {
                info!("Created account {} ({})", user.username, user.id);
                Ok(user)
            }
            // A signup racing this one won the index; report it like any
            // other duplicate.
            Err(ref e) if is_unique_index_violation(e) => Err(AppError::conflict(
                "A user with that username or email already exists.",
            )),
            Err(e) => Err(e),
        }
    }

    /// Checks a username/password pair. `None` means the credentials do not
    /// match any account; callers decide how to report that.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        debug!("Authenticating user: {}", username);

        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        if self.auth.verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM type::thing('user', $id)", USER_FIELDS);
        let mut response = self
            .db
            .query_with_params(&query, json!({ "id": user_id }))
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM user WHERE username = $username LIMIT 1",
            USER_FIELDS
        );
        let mut response = self
            .db
            .query_with_params(&query, json!({ "username": username }))
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Batch lookup preserving no particular order.
    pub async fn get_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {} FROM user WHERE meta::id(id) IN $ids", USER_FIELDS);
        let mut response = self
            .db
            .query_with_params(&query, json!({ "ids": user_ids }))
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users)
    }

    pub async fn is_username_taken(&self, username: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT meta::id(id) AS id FROM user WHERE username = $username LIMIT 1",
                json!({ "username": username }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }

    pub async fn is_email_taken(&self, email: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT meta::id(id) AS id FROM user WHERE email = $email LIMIT 1",
                json!({ "email": email }),
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

    async fn service() -> UserService {
        let config = Config::default();
        let db = Arc::new(Database::connect(&config).await.unwrap());
        UserService::new(db, AuthService::new(&config))
    }

    fn request(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password1: password.to_string(),
            password2: password.to_string(),
        }
    }

    fn field_names(err: AppError) -> Vec<String> {
        match err {
            AppError::ValidatorError(errors) => {
                let mut fields: Vec<String> =
                    errors.field_errors().keys().map(|k| k.to_string()).collect();
                fields.sort();
                fields
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signup_and_authenticate() {
        let users = service().await;
        let user = users
            .signup(&request("sample", "email@example.com", "testpassword"))
            .await
            .unwrap();
        assert_eq!(user.username, "sample");

        let found = users.get_by_username("sample").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "email@example.com");

        assert!(users
            .authenticate("sample", "testpassword")
            .await
            .unwrap()
            .is_some());
        assert!(users
            .authenticate("sample", "wrongpassword")
            .await
            .unwrap()
            .is_none());
        assert!(users
            .authenticate("nobody", "testpassword")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_signup_empty_form_reports_every_field() {
        let users = service().await;
        let err = users.signup(&request("", "", "")).await.unwrap_err();
        assert_eq!(
            field_names(err),
            vec!["email", "password1", "password2", "username"]
        );
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_username() {
        let users = service().await;
        users
            .signup(&request("sample", "email@example.com", "testpassword"))
            .await
            .unwrap();

        let err = users
            .signup(&request("sample", "other@example.com", "testpassword"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["username"]);

        let err = users
            .signup(&request("sample2", "email@example.com", "testpassword"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["email"]);
    }

    #[tokio::test]
    async fn test_signup_password_policy() {
        let users = service().await;

        let err = users
            .signup(&request("sample", "email@example.com", "pu"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["password2"]);

        let err = users
            .signup(&request("sample", "email@example.com", "12345678"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["password2"]);

        let err = users
            .signup(&request("sample", "email@example.com", "sample001"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["password2"]);
    }

    #[tokio::test]
    async fn test_signup_password_mismatch() {
        let users = service().await;
        let mut payload = request("sample", "email@example.com", "testpassword");
        payload.password2 = "testpasswora".to_string();

        let err = users.signup(&payload).await.unwrap_err();
        assert_eq!(field_names(err), vec!["password2"]);
    }

    #[tokio::test]
    async fn test_signup_invalid_email() {
        let users = service().await;
        let err = users
            .signup(&request("sample", "email", "testpassword"))
            .await
            .unwrap_err();
        assert_eq!(field_names(err), vec!["email"]);
    }
}
