use crate::config::AppConfig;
use crate::entities::{prelude::*, users};
use crate::utils::password::hash_password;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

/// Provision the administrator account at startup if it does not exist.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let existing = Users::find()
        .filter(users::Column::Username.eq(&config.admin_username))
        .one(db)
        .await?;

    if existing.is_some() {
        info!("Admin user already exists");
        return Ok(());
    }

    let admin = users::ActiveModel {
        username: Set(config.admin_username.clone()),
        email: Set(config.admin_email.clone()),
        password_hash: Set(hash_password(&config.admin_password)?),
        role: Set(users::Role::Admin),
        ..Default::default()
    };
    admin.insert(db).await?;

    info!("Admin user created");
    Ok(())
}
