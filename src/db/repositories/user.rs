use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use tokio::task;

use crate::entities::users;

/// User projection returned to API clients; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub favorite_genres: Vec<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub birth_date: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        let favorite_genres = model
            .favorite_genres
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            bio: model.bio,
            avatar_url: model.avatar_url,
            favorite_genres,
            location: model.location,
            website: model.website,
            birth_date: model.birth_date,
            created_at: model.created_at,
        }
    }
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub birth_date: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.favorite_genres.is_none()
            && self.location.is_none()
            && self.website.is_none()
            && self.birth_date.is_none()
            && self.password.is_none()
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a user with a hashed password. Returns `None` when the
    /// username or email is already taken.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check for existing user")?;

        if existing.is_some() {
            return Ok(None);
        }

        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(Some(user))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    /// Applies a profile patch. Returns the updated row, or `None` when the
    /// user does not exist.
    pub async fn update_profile(
        &self,
        user_id: i32,
        patch: ProfilePatch,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();

        if let Some(display_name) = patch.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(bio) = patch.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = patch.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(genres) = patch.favorite_genres {
            let raw = serde_json::to_string(&genres).context("Failed to encode genres")?;
            active.favorite_genres = Set(Some(raw));
        }
        if let Some(location) = patch.location {
            active.location = Set(Some(location));
        }
        if let Some(website) = patch.website {
            active.website = Set(Some(website));
        }
        if let Some(birth_date) = patch.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(password) = patch.password {
            let new_hash = task::spawn_blocking(move || hash_password(&password))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(new_hash);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update profile")?;

        Ok(Some(updated))
    }
}

/// Hash a password using Argon2id.
/// CPU-intensive; call from `spawn_blocking` on the async runtime.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash on the blocking pool.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}
