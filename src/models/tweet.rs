use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Hard cap on tweet length, counted in characters.
pub const MAX_TWEET_LENGTH: usize = 140;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTweetRequest {
    #[serde(default)]
    #[validate(custom = "validate_content")]
    pub content: String,
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("This field is required.".into());
        return Err(error);
    }
    let length = content.chars().count();
    if length > MAX_TWEET_LENGTH {
        let mut error = ValidationError::new("max_length");
        error.message = Some(
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_TWEET_LENGTH, length
            )
            .into(),
        );
        return Err(error);
    }
    Ok(())
}

/// A tweet joined with its author, the shape list views render.
#[derive(Debug, Clone, Serialize)]
pub struct TweetWithAuthor {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_within_limit() {
        let request = CreateTweetRequest {
            content: "a".repeat(MAX_TWEET_LENGTH),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_content_over_limit() {
        let request = CreateTweetRequest {
            content: "a".repeat(MAX_TWEET_LENGTH + 1),
        };
        let errors = request.validate().unwrap_err();
        let messages = &errors.field_errors()["content"];
        assert!(messages[0]
            .message
            .as_ref()
            .unwrap()
            .contains("at most 140 characters"));
    }

    #[test]
    fn test_content_required() {
        let request = CreateTweetRequest {
            content: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn test_content_counts_characters_not_bytes() {
        // 140 multibyte characters must pass even though the byte length is larger
        let request = CreateTweetRequest {
            content: "あ".repeat(MAX_TWEET_LENGTH),
        };
        assert!(request.validate().is_ok());
    }
}
