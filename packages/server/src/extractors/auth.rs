use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, Claims};

/// Cookie the admin UI stores its session token in.
pub const ADMIN_COOKIE: &str = "admin_token";

/// Authenticated administrator.
///
/// Add this as a handler parameter to require an admin caller. The token is
/// read from `Authorization: Bearer <token>`, falling back to the
/// `admin_token` cookie. Anyone else gets 401.
#[derive(Debug)]
pub struct AdminUser {
    pub user_id: i32,
    pub username: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ADMIN_COOKIE)
                    .map(|c| c.value().to_owned())
            })
            .ok_or(AppError::Unauthorized)?;

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::Unauthorized)?;

        admin_from_claims(claims)
    }
}

fn admin_from_claims(claims: Claims) -> Result<AdminUser, AppError> {
    if !claims.is_admin() {
        tracing::debug!(user_id = claims.uid, role = %claims.role, "Rejected non-admin caller");
        return Err(AppError::Unauthorized);
    }

    Ok(AdminUser {
        user_id: claims.uid,
        username: claims.sub,
    })
}
