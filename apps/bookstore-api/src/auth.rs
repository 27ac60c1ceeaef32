//! # Authentication
//!
//! Session tokens, the request-scoped [`AuthenticatedUser`], and the
//! `/auth/*` handlers.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Lifecycle                                │
//! │                                                                         │
//! │  POST /auth/sign-in { email, password }                                │
//! │       │  argon2 verify                                                 │
//! │       ▼                                                                 │
//! │  JWT (HS256) { sub, name, email, iat, exp, jti }                       │
//! │       │  INSERT sessions (jti, user_id, expires_at)                    │
//! │       ▼                                                                 │
//! │  Authorization: Bearer <token>  on every protected request             │
//! │       │  signature + exp checked, then the jti must still exist        │
//! │       ▼                                                                 │
//! │  AuthenticatedUser { user, session_id } handed to the handler          │
//! │                                                                         │
//! │  POST /auth/sign-out → DELETE sessions WHERE session_id = jti          │
//! │       → the same token is rejected from then on                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;
use bookstore_core::session::{CurrentUser, SignInInput, SignedIn};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub name: String,

    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, also the `sessions` row key
    pub jti: String,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Signs a session token for `user`.
    pub fn issue(&self, user: &CurrentUser) -> ApiResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.lifetime_secs);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user.user_id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The signed-in user a request acts for.
///
/// Adding this as a handler argument makes the route protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: CurrentUser,
    /// The token's `jti`.
    pub session_id: String,
}

impl FromRequestParts<SharedState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.validate(token)?;

        if !state.db.sessions().is_active(&claims.jti, Utc::now()).await? {
            debug!(jti = %claims.jti, "Token for a closed session");
            return Err(ApiError::unauthorized("Session has ended, sign in again"));
        }

        let user_id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(AuthenticatedUser {
            user: CurrentUser {
                user_id,
                name: claims.name,
                email: claims.email,
            },
            session_id: claims.jti,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/sign-in`
pub async fn sign_in(
    State(state): State<SharedState>,
    Json(input): Json<SignInInput>,
) -> ApiResult<Json<SignedIn>> {
    let input = input.validate()?;
    debug!(email = %input.email, "sign_in");

    let user = state
        .db
        .users()
        .verify_credentials(&input.email, &input.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let current = CurrentUser::from(&user);
    let issued = state.jwt.issue(&current)?;

    let sessions = state.db.sessions();
    sessions.purge_expired(Utc::now()).await?;
    sessions
        .create(&issued.jti, current.user_id, issued.expires_at)
        .await?;

    info!(user_id = current.user_id, "Signed in");

    Ok(Json(SignedIn {
        token: issued.token,
        expires_at: issued.expires_at,
        user: current,
    }))
}

/// `POST /auth/sign-out`
pub async fn sign_out(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<StatusCode> {
    state.db.sessions().delete(&auth.session_id).await?;
    info!(user_id = auth.user.user_id, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn session(auth: AuthenticatedUser) -> Json<CurrentUser> {
    Json(auth.user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            user_id: 7,
            name: "Admin".to_string(),
            email: "admin@bookstore.local".to_string(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let issued = manager.issue(&user()).unwrap();
        let claims = manager.validate(&issued.token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "admin@bookstore.local");
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = JwtManager::new("one".to_string(), 3600).issue(&user()).unwrap();
        let err = JwtManager::new("two".to_string(), 3600)
            .validate(&issued.token)
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret".to_string(), -120);
        let issued = manager.issue(&user()).unwrap();
        assert!(manager.validate(&issued.token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
