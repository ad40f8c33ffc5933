use async_trait::async_trait;
use cloud_storage_backend::api::error::AppError;
use cloud_storage_backend::entities::users;
use cloud_storage_backend::infrastructure::database::run_migrations;
use cloud_storage_backend::services::file_service::FileService;
use cloud_storage_backend::services::storage::ObjectStorage;
use cloud_storage_backend::services::user_service::UserService;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory object store with an injectable delete failure.
struct MockObjectStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_delete: AtomicBool,
}

impl MockObjectStorage {
    fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_delete: AtomicBool::new(false),
        }
    }

    fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such key: {}", key))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("injected delete failure"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> anyhow::Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .remove(old_key)
            .ok_or_else(|| anyhow::anyhow!("no such key: {}", old_key))?;
        objects.insert(new_key.to_string(), data);
        Ok(())
    }

    fn bucket(&self) -> &str {
        "test-bucket"
    }
}

async fn setup() -> (
    DatabaseConnection,
    Arc<MockObjectStorage>,
    FileService,
    users::Model,
) {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();

    let storage = Arc::new(MockObjectStorage::new());
    let service = FileService::new(db.clone(), storage.clone());

    let owner = UserService::new(db.clone())
        .create_user("alice", "pw123456", "alice@x.io", users::Role::User)
        .await
        .unwrap();

    (db, storage, service, owner)
}

#[tokio::test]
async fn upload_stores_object_and_metadata() {
    let (_db, storage, service, owner) = setup().await;

    let record = service
        .upload(&owner, "notes.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();

    assert_eq!(record.filename, "notes.txt");
    assert_eq!(record.size, 5);
    assert_eq!(record.owner_id, owner.id);
    assert_eq!(record.file_path, format!("test-bucket/{}/notes.txt", owner.id));
    assert!(storage.contains(&format!("{}/notes.txt", owner.id)));
}

#[tokio::test]
async fn upload_rejects_empty_content() {
    let (_db, storage, service, owner) = setup().await;

    let err = service
        .upload(&owner, "empty.txt", Vec::new(), "text/plain")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(storage.object_count(), 0);
}

#[tokio::test]
async fn reupload_replaces_row_and_object() {
    let (_db, storage, service, owner) = setup().await;

    let first = service
        .upload(&owner, "notes.txt", b"v1".to_vec(), "text/plain")
        .await
        .unwrap();
    let second = service
        .upload(&owner, "notes.txt", b"version two".to_vec(), "text/plain")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.size, 11);
    assert_eq!(storage.object_count(), 1);

    let listed = service.list(&owner, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, second.id);
}

#[tokio::test]
async fn list_returns_newest_first_up_to_limit() {
    let (_db, _storage, service, owner) = setup().await;

    for name in ["a.txt", "b.txt", "c.txt"] {
        service
            .upload(&owner, name, b"x".to_vec(), "text/plain")
            .await
            .unwrap();
    }

    let listed = service.list(&owner, 2).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].filename, "c.txt");
    assert_eq!(listed[1].filename, "b.txt");

    let err = service.list(&owner, 0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn rename_preserves_id_and_timestamp() {
    let (_db, storage, service, owner) = setup().await;

    let original = service
        .upload(&owner, "notes.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();

    let renamed = service
        .rename(&owner, "notes.txt", "notes2.txt")
        .await
        .unwrap();

    assert_eq!(renamed.id, original.id);
    assert_eq!(renamed.uploaded_at, original.uploaded_at);
    assert_eq!(renamed.filename, "notes2.txt");
    assert!(storage.contains(&format!("{}/notes2.txt", owner.id)));
    assert!(!storage.contains(&format!("{}/notes.txt", owner.id)));
}

#[tokio::test]
async fn rename_conflict_leaves_everything_untouched() {
    let (_db, storage, service, owner) = setup().await;

    service
        .upload(&owner, "notes.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();
    service
        .upload(&owner, "taken.txt", b"busy".to_vec(), "text/plain")
        .await
        .unwrap();

    let err = service
        .rename(&owner, "notes.txt", "taken.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Both files still present under their original names.
    assert!(storage.contains(&format!("{}/notes.txt", owner.id)));
    assert!(storage.contains(&format!("{}/taken.txt", owner.id)));
    let listed = service.list(&owner, 10).await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn rename_rejects_blank_target_and_missing_source() {
    let (_db, _storage, service, owner) = setup().await;

    let err = service.rename(&owner, "ghost.txt", "  ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = service
        .rename(&owner, "ghost.txt", "fresh.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn failed_object_delete_restores_the_metadata_row() {
    let (_db, storage, service, owner) = setup().await;

    let record = service
        .upload(&owner, "notes.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();

    storage.set_fail_delete(true);
    let err = service.delete(&owner, "notes.txt").await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    // The row is back with its original identity.
    let listed = service.list(&owner, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
    assert_eq!(listed[0].uploaded_at, record.uploaded_at);
    assert!(storage.contains(&format!("{}/notes.txt", owner.id)));

    // Once the store recovers, the delete goes through.
    storage.set_fail_delete(false);
    service.delete(&owner, "notes.txt").await.unwrap();
    assert!(service.list(&owner, 10).await.unwrap().is_empty());
    assert_eq!(storage.object_count(), 0);
}

#[tokio::test]
async fn delete_of_unknown_file_is_not_found() {
    let (_db, _storage, service, owner) = setup().await;

    let err = service.delete(&owner, "ghost.txt").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn purge_removes_all_rows_and_objects_of_the_owner() {
    let (db, storage, service, owner) = setup().await;

    let other = UserService::new(db.clone())
        .create_user("bob", "pw123456", "bob@x.io", users::Role::User)
        .await
        .unwrap();

    for name in ["a.txt", "b.txt"] {
        service
            .upload(&owner, name, b"x".to_vec(), "text/plain")
            .await
            .unwrap();
    }
    service
        .upload(&other, "keep.txt", b"y".to_vec(), "text/plain")
        .await
        .unwrap();

    let purged = service.purge_user_files(&owner).await.unwrap();
    assert_eq!(purged, 2);

    assert!(service.list(&owner, 10).await.unwrap().is_empty());
    assert_eq!(service.list(&other, 10).await.unwrap().len(), 1);
    assert_eq!(storage.object_count(), 1);
    assert!(storage.contains(&format!("{}/keep.txt", other.id)));
}

#[tokio::test]
async fn download_returns_stored_bytes() {
    let (_db, _storage, service, owner) = setup().await;

    service
        .upload(&owner, "notes.txt", b"hello world".to_vec(), "text/plain")
        .await
        .unwrap();

    let bytes = service.download(&owner, "notes.txt").await.unwrap();
    assert_eq!(bytes, b"hello world");

    let err = service.download(&owner, "ghost.txt").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
