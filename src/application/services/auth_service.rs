//! Authentication Service
//!
//! Handles registration, login, JWT access tokens and refresh-token sessions.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::config::JwtSettings;
use crate::domain::{Profile, ProfileRepository, ProfileRole, Session, SessionRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new customer profile and open a session
    async fn register(&self, request: RegisterDto) -> Result<(Profile, AuthTokens), AuthError>;

    /// Authenticate with email and password
    async fn login(&self, email: &str, password: &str) -> Result<(Profile, AuthTokens), AuthError>;

    /// Rotate a refresh token into a new token pair
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke the session behind a refresh token. Unknown tokens are ignored.
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterDto {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (profile ID)
    pub sub: String,
    /// Profile role at issue time
    pub role: ProfileRole,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID for token revocation tracking
    pub jti: String,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Email already registered")]
    EmailExists,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailExists => AppError::Conflict(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Store(inner) => inner,
            e => AppError::Unauthorized(e.to_string()),
        }
    }
}

/// Sign an access token for a profile.
pub fn encode_access_token(
    settings: &JwtSettings,
    profile_id: i64,
    role: ProfileRole,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: profile_id.to_string(),
        role,
        exp: (now + Duration::minutes(settings.access_token_expiry_minutes)).timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
}

/// Decode and validate an access token.
pub fn decode_access_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// AuthService implementation
pub struct AuthServiceImpl<P, S>
where
    P: ProfileRepository,
    S: SessionRepository,
{
    profile_repo: Arc<P>,
    session_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
}

impl<P, S> AuthServiceImpl<P, S>
where
    P: ProfileRepository,
    S: SessionRepository,
{
    pub fn new(
        profile_repo: Arc<P>,
        session_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
    ) -> Self {
        Self {
            profile_repo,
            session_repo,
            id_generator,
            jwt_settings,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash refresh token for storage
    fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn generate_tokens(&self, profile: &Profile) -> Result<AuthTokens, AuthError> {
        let access_token = encode_access_token(&self.jwt_settings, profile.id, profile.role)?;

        // Opaque: random_uuid.random_uuid, carries no profile data
        let refresh_token = format!("{}.{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days)
    }

    async fn open_session(&self, profile: &Profile) -> Result<AuthTokens, AuthError> {
        let tokens = self.generate_tokens(profile)?;
        let session = Session::new(
            profile.id,
            Self::hash_refresh_token(&tokens.refresh_token),
            self.refresh_expiry(),
        );
        self.session_repo.create(&session).await?;
        Ok(tokens)
    }
}

#[async_trait]
impl<P, S> AuthService for AuthServiceImpl<P, S>
where
    P: ProfileRepository + 'static,
    S: SessionRepository + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: RegisterDto) -> Result<(Profile, AuthTokens), AuthError> {
        let email = Profile::normalize_email(&request.email);

        if self.profile_repo.email_exists(&email).await? {
            return Err(AuthError::EmailExists);
        }

        let now = Utc::now();
        let profile = Profile {
            id: self.id_generator.generate(),
            email,
            password_hash: self.hash_password(&request.password)?,
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            avatar_url: None,
            role: ProfileRole::Customer,
            created_at: now,
            updated_at: now,
        };

        let profile = self.profile_repo.create(&profile).await?;
        let tokens = self.open_session(&profile).await?;

        tracing::info!(profile_id = profile.id, "Profile registered");
        Ok((profile, tokens))
    }

    async fn login(&self, email: &str, password: &str) -> Result<(Profile, AuthTokens), AuthError> {
        let profile = self
            .profile_repo
            .find_by_email(&Profile::normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &profile.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.open_session(&profile).await?;
        Ok((profile, tokens))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let presented_hash = Self::hash_refresh_token(refresh_token);
        let session = self
            .session_repo
            .find_by_token_hash(&presented_hash)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_active() {
            return Err(AuthError::TokenExpired);
        }

        // Re-read the profile so a role change shows up in the new access token
        let profile = self
            .profile_repo
            .find_by_id(session.profile_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let tokens = self.generate_tokens(&profile)?;
        let rotated = self
            .session_repo
            .rotate(
                session.id,
                &presented_hash,
                &Self::hash_refresh_token(&tokens.refresh_token),
                self.refresh_expiry(),
            )
            .await?;

        // The presented token was already spent by a concurrent refresh
        if !rotated {
            return Err(AuthError::SessionNotFound);
        }
        Ok(tokens)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let session = self
            .session_repo
            .find_by_token_hash(&Self::hash_refresh_token(refresh_token))
            .await?;

        if let Some(session) = session {
            self.session_repo.revoke(session.id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_settings;
    use crate::domain::{MockProfileRepository, MockSessionRepository};
    use mockall::predicate::eq;

    fn service(
        profiles: MockProfileRepository,
        sessions: MockSessionRepository,
    ) -> AuthServiceImpl<MockProfileRepository, MockSessionRepository> {
        AuthServiceImpl::new(
            Arc::new(profiles),
            Arc::new(sessions),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            test_settings().jwt,
        )
    }

    fn profile_with_password(password: &str) -> Profile {
        let svc = service(MockProfileRepository::new(), MockSessionRepository::new());
        let now = Utc::now();
        Profile {
            id: 42,
            email: "ann@example.com".into(),
            password_hash: svc.hash_password(password).unwrap(),
            full_name: "Ann".into(),
            phone: None,
            avatar_url: None,
            role: ProfileRole::Staff,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_roundtrip_carries_role() {
        let settings = test_settings().jwt;
        let token = encode_access_token(&settings, 7, ProfileRole::SalonOwner).unwrap();
        let claims = decode_access_token(&settings.secret, &token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.role, ProfileRole::SalonOwner);

        assert!(matches!(
            decode_access_token("another-secret-of-at-least-32-chars!!", &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_email_exists()
            .with(eq("ann@example.com"))
            .returning(|_| Ok(true));

        let svc = service(profiles, MockSessionRepository::new());
        let result = svc
            .register(RegisterDto {
                email: " Ann@Example.com".into(),
                password: "password123".into(),
                full_name: "Ann".into(),
                phone: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::EmailExists)));
    }

    #[tokio::test]
    async fn test_register_creates_customer_and_session() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_email_exists().returning(|_| Ok(false));
        profiles.expect_create().returning(|p| Ok(p.clone()));
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .withf(|s| s.refresh_token_hash.len() == 64)
            .times(1)
            .returning(|s| Ok(s.clone()));

        let svc = service(profiles, sessions);
        let (profile, tokens) = svc
            .register(RegisterDto {
                email: "new@example.com".into(),
                password: "password123".into(),
                full_name: " New Person ".into(),
                phone: None,
            })
            .await
            .unwrap();

        assert_eq!(profile.role, ProfileRole::Customer);
        assert_eq!(profile.full_name, "New Person");
        assert_eq!(tokens.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let stored = profile_with_password("correct-horse");
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));

        let svc = service(profiles, MockSessionRepository::new());
        let result = svc.login("ann@example.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_email().returning(|_| Ok(None));

        let svc = service(profiles, MockSessionRepository::new());
        let err = svc.login("nobody@example.com", "x").await.unwrap_err();
        assert_eq!(AppError::from(err).to_string(), "Unauthorized: Invalid email or password");
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_session() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|hash| {
            let mut session = Session::new(1, hash.to_string(), Utc::now() + Duration::days(1));
            session.revoked_at = Some(Utc::now());
            Ok(Some(session))
        });

        let svc = service(MockProfileRepository::new(), sessions);
        assert!(matches!(svc.refresh("a.b").await, Err(AuthError::TokenExpired)));
    }

    fn live_session(profile_id: i64, hash: &str) -> Session {
        Session::new(profile_id, hash.to_string(), Utc::now() + Duration::days(1))
    }

    #[tokio::test]
    async fn test_refresh_rotates_token_pair() {
        let stored = profile_with_password("correct-horse");
        let old_hash =
            AuthServiceImpl::<MockProfileRepository, MockSessionRepository>::hash_refresh_token("old.token");

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_id()
            .with(eq(42))
            .returning(move |_| Ok(Some(stored.clone())));
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_by_token_hash()
            .returning(|hash| Ok(Some(live_session(42, hash))));
        sessions
            .expect_rotate()
            .withf(move |_, old, new, expires_at| {
                old == old_hash.as_str() && new != old_hash.as_str() && *expires_at > Utc::now()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let tokens = service(profiles, sessions).refresh("old.token").await.unwrap();
        assert_ne!(tokens.refresh_token, "old.token");
        let claims = decode_access_token(&test_settings().jwt.secret, &tokens.access_token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, ProfileRole::Staff);
    }

    #[tokio::test]
    async fn test_refresh_losing_rotation_race_is_rejected() {
        let stored = profile_with_password("correct-horse");
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_by_token_hash()
            .returning(|hash| Ok(Some(live_session(42, hash))));
        sessions.expect_rotate().returning(|_, _, _, _| Ok(false));

        let err = service(profiles, sessions).refresh("old.token").await.unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));
        assert!(matches!(AppError::from(err), AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_unknown_token_is_ok() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|_| Ok(None));
        sessions.expect_revoke().never();

        let svc = service(MockProfileRepository::new(), sessions);
        assert!(svc.logout("unknown").await.is_ok());
    }
}
