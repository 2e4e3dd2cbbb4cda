//! Authenticated request context.
//!
//! The gateway in front of this service verifies the caller's token and
//! forwards the identity in headers; the core trusts that value
//! unconditionally and carries it as one strongly typed struct instead of
//! ad-hoc context lookups.

use std::future::{ready, Ready};

use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpRequest};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

/// Verified caller identity for the current request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());

        let username = req
            .headers()
            .get(USERNAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        ready(match (user_id, username) {
            (Some(user_id), Some(username)) if !username.is_empty() => {
                Ok(AuthContext { user_id, username })
            }
            _ => Err(ErrorUnauthorized("missing or invalid identity headers")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_rt::test]
    async fn extracts_identity_from_headers() {
        let user_id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, user_id.to_string()))
            .insert_header((USERNAME_HEADER, "alice"))
            .to_http_request();

        let ctx = AuthContext::extract(&req).await.unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.username, "alice");
    }

    #[actix_rt::test]
    async fn rejects_missing_headers() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthContext::extract(&req).await.is_err());
    }

    #[actix_rt::test]
    async fn rejects_malformed_user_id() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .insert_header((USERNAME_HEADER, "alice"))
            .to_http_request();
        assert!(AuthContext::extract(&req).await.is_err());
    }
}
