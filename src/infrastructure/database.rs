use crate::entities::{files, users};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm::{ConnectionTrait, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("Running auto-migrations...");

    // Order matters for the foreign key: users before files.
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "files",
            schema
                .create_table_from_entity(files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        match db.execute(stmt).await {
            Ok(_) => info!("Table '{}' checked/created", name),
            Err(e) => tracing::warn!("Failed to create table '{}': {}", name, e),
        }
    }

    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_files_owner_id ON files(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_files_filename ON files(filename)",
    ];

    for query in indexes {
        if let Err(e) = db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            tracing::warn!("Index creation warning: {} -> {}", query, e);
        }
    }

    Ok(())
}
