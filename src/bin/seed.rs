//! Resets the user collection and creates the default admin account.

use std::sync::Arc;

use movieflix_api::{
    config::{Config, StorageBackend},
    db::{self, MemoryStore, PgStore, UserStore},
    error::AppResult,
    models::User,
    services::auth::hash_password,
};
use tracing_subscriber::EnvFilter;

const ADMIN_NAME: &str = "Admin User";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let users: Arc<dyn UserStore> = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Seeding in-memory storage has no lasting effect");
            Arc::new(MemoryStore::new())
        }
    };

    let admin = seed_admin(users.as_ref(), config.bcrypt_cost).await?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "Data imported, admin account created");
    println!("Admin login: {} / {}", ADMIN_EMAIL, ADMIN_PASSWORD);
    Ok(())
}

/// Clears all users and stores the admin account
async fn seed_admin(users: &dyn UserStore, bcrypt_cost: u32) -> AppResult<User> {
    users.delete_all().await?;

    let password_hash = hash_password(ADMIN_PASSWORD.to_string(), bcrypt_cost).await?;
    let mut admin = User::new(ADMIN_NAME.to_string(), ADMIN_EMAIL.to_string(), password_hash);
    admin.is_admin = true;
    users.insert(&admin).await?;

    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use movieflix_api::services::auth::verify_password;

    #[tokio::test]
    async fn test_seed_replaces_users_with_admin() {
        let store = MemoryStore::new();
        let other = User::new("Ada".to_string(), "ada@example.com".to_string(), "hash".to_string());
        store.insert(&other).await.unwrap();

        let admin = seed_admin(&store, 4).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.find_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(stored.id, admin.id);
        assert!(stored.is_admin);
        assert_ne!(stored.password_hash, ADMIN_PASSWORD);
        assert!(verify_password(ADMIN_PASSWORD.to_string(), stored.password_hash)
            .await
            .unwrap());
    }
}
