use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::utils::password::hash_password;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

/// Account registration, lookup, profile updates and deletion. Passwords
/// are hashed before they ever reach the catalog.
pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: users::Role,
    ) -> Result<users::Model, AppError> {
        if Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with that username already exists".to_string(),
            ));
        }
        if Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with that email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password).map_err(AppError::Anyhow)?;

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            role: Set(role),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("New user created: {}", user.username);
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<users::Model, AppError> {
        Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with name: {}", username)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<users::Model, AppError> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with email: {}", email)))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<users::Model, AppError> {
        Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", id)))
    }

    /// Overwrite the three mutable profile fields. Uniqueness of the new
    /// username and email is re-validated against other accounts.
    pub async fn update_profile(
        &self,
        user: users::Model,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<users::Model, AppError> {
        if Users::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::Id.ne(user.id))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with that username already exists".to_string(),
            ));
        }
        if Users::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Id.ne(user.id))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with that email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password).map_err(AppError::Anyhow)?;

        let user_id = user.id;
        let mut active: users::ActiveModel = user.into();
        active.username = Set(username.to_string());
        active.email = Set(email.to_string());
        active.password_hash = Set(password_hash);
        let updated = active.update(&self.db).await?;

        info!("User {} updated", user_id);
        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let res = Users::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User not found with id: {}", id)));
        }
        info!("User {} deleted", id);
        Ok(())
    }
}
