use crate::api::error::AppError;
use crate::entities::{files, prelude::*, users};
use crate::services::storage::ObjectStorage;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the object store and the metadata catalog. Each operation
/// is a short sequence of existence checks and delegated calls; partial
/// failures are compensated best-effort (no cross-store transaction exists).
pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn ObjectStorage>,
}

impl FileService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { db, storage }
    }

    /// Object keys are scoped per owner so same-named files of different
    /// users never collide in the bucket.
    fn object_key(owner_id: i64, filename: &str) -> String {
        format!("{}/{}", owner_id, filename)
    }

    fn file_path(&self, owner_id: i64, filename: &str) -> String {
        format!(
            "{}/{}",
            self.storage.bucket(),
            Self::object_key(owner_id, filename)
        )
    }

    async fn find_record(
        &self,
        owner_id: i64,
        filename: &str,
    ) -> Result<Option<files::Model>, AppError> {
        let record = Files::find()
            .filter(files::Column::OwnerId.eq(owner_id))
            .filter(files::Column::Filename.eq(filename))
            .one(&self.db)
            .await?;
        Ok(record)
    }

    /// Store an uploaded file. An existing record for (filename, owner) is
    /// replaced: old object and row removed, new object and row created with
    /// a fresh timestamp.
    pub async fn upload(
        &self,
        owner: &users::Model,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<files::Model, AppError> {
        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let key = Self::object_key(owner.id, filename);
        let size = data.len() as i64;

        if let Some(existing) = self.find_record(owner.id, filename).await? {
            info!(
                "File '{}' already exists for user {}, replacing",
                filename, owner.username
            );
            self.storage
                .delete(&key)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
            existing.delete(&self.db).await?;
        }

        // Object first; the row is only inserted once the content is stored.
        self.storage
            .put(&key, data, content_type)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let record = files::ActiveModel {
            filename: Set(filename.to_string()),
            owner_id: Set(owner.id),
            file_path: Set(self.file_path(owner.id, filename)),
            size: Set(size),
            uploaded_at: Set(Utc::now()),
            ..Default::default()
        };

        match record.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) => {
                // Compensation: drop the just-stored object instead of
                // leaving an orphan. Idempotent, best-effort.
                if let Err(del) = self.storage.delete(&key).await {
                    warn!(
                        "Failed to delete orphaned object '{}' after metadata insert error: {}",
                        key, del
                    );
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// Newest-first listing, at most `limit` records.
    pub async fn list(
        &self,
        owner: &users::Model,
        limit: i64,
    ) -> Result<Vec<files::Model>, AppError> {
        if limit <= 0 {
            return Err(AppError::InvalidInput(
                "Limit must be a positive integer".to_string(),
            ));
        }

        let records = Files::find()
            .filter(files::Column::OwnerId.eq(owner.id))
            .order_by_desc(files::Column::Id)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(records)
    }

    /// Rename a file in the store and update the row in place, preserving
    /// its id and upload timestamp.
    pub async fn rename(
        &self,
        owner: &users::Model,
        old_name: &str,
        new_name: &str,
    ) -> Result<files::Model, AppError> {
        if new_name.trim().is_empty() {
            return Err(AppError::InvalidInput("New filename is empty".to_string()));
        }

        let record = self
            .find_record(owner.id, old_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File not found: {}", old_name)))?;

        if self.find_record(owner.id, new_name).await?.is_some() {
            return Err(AppError::Conflict(
                "A file with that name already exists".to_string(),
            ));
        }

        self.storage
            .rename(
                &Self::object_key(owner.id, old_name),
                &Self::object_key(owner.id, new_name),
            )
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let mut active: files::ActiveModel = record.into();
        active.filename = Set(new_name.to_string());
        active.file_path = Set(self.file_path(owner.id, new_name));
        let updated = active.update(&self.db).await?;

        Ok(updated)
    }

    /// Delete the metadata row first, then the object. A failed object
    /// deletion re-inserts the row (same id, same timestamp) and surfaces
    /// the error, so a successful call always means the row is gone.
    pub async fn delete(&self, owner: &users::Model, filename: &str) -> Result<(), AppError> {
        let record = self
            .find_record(owner.id, filename)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File not found: {}", filename)))?;

        record.clone().delete(&self.db).await?;

        let key = Self::object_key(owner.id, filename);
        if let Err(e) = self.storage.delete(&key).await {
            warn!(
                "Object deletion failed for '{}', re-inserting metadata row {}",
                key, record.id
            );
            let restore = files::ActiveModel {
                id: Set(record.id),
                filename: Set(record.filename),
                owner_id: Set(record.owner_id),
                file_path: Set(record.file_path),
                size: Set(record.size),
                uploaded_at: Set(record.uploaded_at),
            };
            if let Err(re) = restore.insert(&self.db).await {
                tracing::error!("Compensating re-insert failed: {}", re);
            }
            return Err(AppError::Storage(e.to_string()));
        }

        Ok(())
    }

    /// Fetch the raw bytes of an owned file.
    pub async fn download(
        &self,
        owner: &users::Model,
        filename: &str,
    ) -> Result<Vec<u8>, AppError> {
        self.find_record(owner.id, filename)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File not found: {}", filename)))?;

        let bytes = self
            .storage
            .get(&Self::object_key(owner.id, filename))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(bytes)
    }

    /// Remove every file record of an account plus the stored objects.
    /// Object deletions are best-effort; rows are always removed.
    pub async fn purge_user_files(&self, owner: &users::Model) -> Result<u64, AppError> {
        let records = Files::find()
            .filter(files::Column::OwnerId.eq(owner.id))
            .all(&self.db)
            .await?;

        for record in &records {
            let key = Self::object_key(owner.id, &record.filename);
            if let Err(e) = self.storage.delete(&key).await {
                warn!("Failed to delete object '{}' during account purge: {}", key, e);
            }
        }

        let res = Files::delete_many()
            .filter(files::Column::OwnerId.eq(owner.id))
            .exec(&self.db)
            .await?;

        Ok(res.rows_affected)
    }
}
