// 🛡️ Access Guard
// Gates every protected route: bearer token → verified identity → live user
//
// On success the resolved `CurrentUser` (secret excluded) is attached to the
// request extensions. On failure the request never reaches a handler.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::ApiError;
use crate::token::fingerprint;
use crate::users::{find_user_by_id, User};

/// The acting identity for the duration of one request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

const NO_TOKEN: &str = "Not authorized, no token";
const TOKEN_FAILED: &str = "Not authorized, token failed";
const USER_NOT_FOUND: &str = "User not found";

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// Scheme is case-sensitive, separated by exactly one space, and the token
/// itself must be non-empty with no embedded whitespace.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let unauthenticated = || ApiError::Unauthenticated(NO_TOKEN.to_string());

    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(unauthenticated)?
        .to_str()
        .map_err(|_| unauthenticated())?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => Err(unauthenticated()),
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let identity = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(token = %fingerprint(token), error = %e, "token rejected");
        ApiError::Unauthenticated(TOKEN_FAILED.to_string())
    })?;

    let user = {
        let conn = state.conn()?;
        find_user_by_id(&conn, &identity)?
    };

    let user = user.ok_or_else(|| {
        tracing::debug!(identity = %identity, "token for unknown user");
        ApiError::Unauthenticated(USER_NOT_FOUND.to_string())
    })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(v) = value {
            map.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_well_formed_header() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_malformed_headers_rejected() {
        let cases = [
            None,
            Some(""),
            Some("Bearer"),
            Some("Bearer "),
            Some("bearer abc"),
            Some("Basic abc"),
            Some("Bearerabc"),
            Some("Bearer  abc"),
            Some("Bearer abc def"),
            Some("Token abc"),
        ];

        for case in cases {
            let err = bearer_token(&headers(case)).unwrap_err();
            assert!(
                matches!(err, ApiError::Unauthenticated(_)),
                "expected Unauthenticated for {:?}",
                case
            );
        }
    }
}
