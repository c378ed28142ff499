use crate::{error::AppError, models::user::User, services::auth::SESSION_COOKIE, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the session (Bearer token or `session` cookie) to an account and
/// stores it in the request extensions. Requests without a valid session
/// proceed unauthenticated; route extractors decide whether that is fatal.
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(token) = session_token(request.headers()) {
        match app_state.auth_service.verify_token(&token) {
            Ok(claims) => match app_state.user_service.get_by_id(&claims.sub).await {
                Ok(Some(user)) => {
                    debug!("Authenticated user: {} ({})", user.username, user.id);
                    request.extensions_mut().insert(user);
                }
                Ok(None) => warn!("Valid session for unknown user: {}", claims.sub),
                Err(e) => warn!("Failed to load session user: {}", e),
            },
            Err(e) => {
                debug!("Session token rejected: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Required-authentication extractor.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }
}

/// Optional-authentication extractor.
pub struct OptionalUser(pub Option<User>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();
        Ok(OptionalUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(session_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_cookie_token_extraction() {
        let headers = headers_with(header::COOKIE, "theme=dark; session=abc.def.ghi");
        assert_eq!(session_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let headers = headers_with(header::COOKIE, "theme=dark");
        assert_eq!(session_token(&headers), None);
    }

    #[tokio::test]
    async fn test_user_extractors() {
        use axum::extract::FromRequestParts;
        use chrono::Utc;

        let user = User {
            id: "u1".to_string(),
            username: "sample".to_string(),
            email: "sample@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };

        let mut request = axum::http::Request::builder().body(()).unwrap();
        request.extensions_mut().insert(user);
        let (mut parts, _) = request.into_parts();

        let CurrentUser(found) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.id, "u1");
        let OptionalUser(found) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_some());

        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();
        assert!(CurrentUser::from_request_parts(&mut parts, &())
            .await
            .is_err());
        let OptionalUser(found) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
