use std::env;

/// Runtime configuration for the storage backend.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT signing secret (symmetric, HS256).
    pub jwt_secret: String,

    /// Token validity window in seconds (default: 3600).
    pub token_ttl_secs: i64,

    /// Default number of entries returned by the file listing (default: 10).
    pub default_list_limit: i64,

    /// Maximum accepted upload size in bytes (default: 256 MB).
    pub max_file_size: usize,

    /// Bootstrap administrator account, created at startup if absent.
    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            token_ttl_secs: 3600,
            default_list_limit: 10,
            max_file_size: 256 * 1024 * 1024,
            admin_username: "admin".to_string(),
            admin_password: "admin12345".to_string(),
            admin_email: "admin@admin.ru".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_ttl_secs),

            default_list_limit: env::var("DEFAULT_LIST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_list_limit),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or(default.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(default.admin_password),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or(default.admin_email),
        }
    }

    /// Config for tests and local development.
    pub fn development() -> Self {
        Self {
            jwt_secret: "dev-secret".to_string(),
            ..Self::default()
        }
    }
}
