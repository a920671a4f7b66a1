use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{email_taken, UserStore},
    error::{AppError, AppResult},
    models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User},
};

const NO_TOKEN: &str = "Not authorized, no token";
const TOKEN_FAILED: &str = "Not authorized, token failed";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 bearer tokens
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::days(lifetime_days),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Returns the user id carried by a valid, unexpired token
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|e| AppError::Internal(format!("Malformed token subject: {}", e)))
    }
}

/// Hashes a password off the async runtime
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// Credential checks, registration and profile updates
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenKeys,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenKeys, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// Unknown emails and wrong passwords are reported with different messages.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email".to_string()))?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized("Password not match".to_string()));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.respond(&user)
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(email_taken());
        }

        if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::InvalidInput("Invalid user data".to_string()));
        }

        let password_hash = hash_password(request.password, self.bcrypt_cost).await?;
        let user = User::new(request.name, request.email, password_hash);
        // the store re-checks the email, another registration may have won meanwhile
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.respond(&user)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<AuthResponse> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(name) = update.name.filter(|name| !name.is_empty()) {
            user.name = name;
        }

        if let Some(email) = update.email.filter(|email| !email.is_empty()) {
            if email != user.email {
                if let Some(owner) = self.users.find_by_email(&email).await? {
                    if owner.id != user.id {
                        return Err(email_taken());
                    }
                }
                user.email = email;
            }
        }

        if let Some(password) = update.password.filter(|password| !password.is_empty()) {
            user.password_hash = hash_password(password, self.bcrypt_cost).await?;
        }

        self.users.save(&user).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        self.respond(&user)
    }

    /// Resolves a bearer token to the user it was issued for
    pub async fn authenticate(&self, token: Option<&str>) -> AppResult<User> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string()))?;

        let user_id = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            AppError::Unauthorized(TOKEN_FAILED.to_string())
        })?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(TOKEN_FAILED.to_string()))
    }

    fn respond(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthResponse::new(user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockUserStore};

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", 30)
    }

    async fn stored_user(password: &str) -> User {
        let hash = hash_password(password.to_string(), 4).await.unwrap();
        User::new("Ada".to_string(), "ada@example.com".to_string(), hash)
    }

    #[test]
    fn test_token_roundtrip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = TokenKeys::new("other", 30).issue(Uuid::new_v4()).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = TokenKeys::new("test-secret", -2).issue(Uuid::new_v4()).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[tokio::test]
    async fn test_login_distinguishes_unknown_email() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_email()
            .withf(|email| email == "nobody@example.com")
            .returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(store), keys(), 4);
        let err = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid email"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = stored_user("right").await;
        let mut store = MockUserStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(store), keys(), 4);
        let err = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Password not match"));
    }

    #[tokio::test]
    async fn test_register_existing_email_does_not_insert() {
        let user = stored_user("pw").await;
        let mut store = MockUserStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_insert().never();

        let service = AuthService::new(Arc::new(store), keys(), 4);
        let err = service
            .register(RegisterRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "User already exists"));
    }

    #[tokio::test]
    async fn test_simultaneous_registrations_keep_one_account() {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(store.clone(), keys(), 4);
        let request = || RegisterRequest {
            name: "Dee".to_string(),
            email: "d@e.com".to_string(),
            password: "pw".to_string(),
        };

        let (a, b) = tokio::join!(service.register(request()), service.register(request()));

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "User already exists"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_missing_and_deleted_user() {
        let mut store = MockUserStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        let service = AuthService::new(Arc::new(store), keys(), 4);

        let err = service.authenticate(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == NO_TOKEN));

        let token = keys().issue(Uuid::new_v4()).unwrap();
        let err = service.authenticate(Some(&token)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == TOKEN_FAILED));

        let err = service.authenticate(Some("garbage")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == TOKEN_FAILED));
    }
}
