use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub baas: BaasConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub enrollment: EnrollmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which BaaS client the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Rest,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaasConfig {
    pub backend: BackendKind,
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub max_file_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConfig {
    pub generated_password_length: usize,
    pub compensation_max_attempts: u32,
    pub compensation_initial_backoff_ms: u64,
    pub compensation_max_backoff_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PRAGXI_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // BaaS overrides
        if let Ok(v) = env::var("PRAGXI_BACKEND") {
            self.baas.backend = match v.as_str() {
                "memory" => BackendKind::Memory,
                _ => BackendKind::Rest,
            };
        }
        if let Ok(v) = env::var("BAAS_URL") {
            self.baas.url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("BAAS_ANON_KEY") {
            self.baas.anon_key = v;
        }
        if let Ok(v) = env::var("BAAS_SERVICE_ROLE_KEY") {
            self.baas.service_role_key = v;
        }
        if let Ok(v) = env::var("BAAS_TIMEOUT_SECS") {
            self.baas.timeout_secs = v.parse().unwrap_or(self.baas.timeout_secs);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_MAX_FILE_BYTES") {
            self.storage.max_file_bytes = v.parse().unwrap_or(self.storage.max_file_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("BAAS_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v
                .parse()
                .unwrap_or(self.security.jwt_expiry_hours)
                .min(crate::auth::MAX_TOKEN_HOURS);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Enrollment overrides
        if let Ok(v) = env::var("ENROLLMENT_PASSWORD_LENGTH") {
            self.enrollment.generated_password_length =
                v.parse().unwrap_or(self.enrollment.generated_password_length);
        }
        if let Ok(v) = env::var("ENROLLMENT_COMPENSATION_ATTEMPTS") {
            self.enrollment.compensation_max_attempts =
                v.parse().unwrap_or(self.enrollment.compensation_max_attempts);
        }
        if let Ok(v) = env::var("ENROLLMENT_COMPENSATION_BACKOFF_MS") {
            self.enrollment.compensation_initial_backoff_ms =
                v.parse().unwrap_or(self.enrollment.compensation_initial_backoff_ms);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            baas: BaasConfig {
                backend: BackendKind::Memory,
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                service_role_key: String::new(),
                timeout_secs: 30,
            },
            storage: StorageConfig {
                bucket: "rider-documents".to_string(),
                max_file_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "pragxi-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            enrollment: EnrollmentConfig {
                generated_password_length: 12,
                compensation_max_attempts: 3,
                compensation_initial_backoff_ms: 50,
                compensation_max_backoff_ms: 1_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            baas: BaasConfig {
                backend: BackendKind::Rest,
                url: String::new(),
                anon_key: String::new(),
                service_role_key: String::new(),
                timeout_secs: 15,
            },
            storage: StorageConfig {
                bucket: "rider-documents".to_string(),
                max_file_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.admin.pragxi.com".to_string()],
            },
            enrollment: EnrollmentConfig {
                generated_password_length: 16,
                compensation_max_attempts: 5,
                compensation_initial_backoff_ms: 200,
                compensation_max_backoff_ms: 5_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                enable_request_logging: false,
            },
            baas: BaasConfig {
                backend: BackendKind::Rest,
                url: String::new(),
                anon_key: String::new(),
                service_role_key: String::new(),
                timeout_secs: 10,
            },
            storage: StorageConfig {
                bucket: "rider-documents".to_string(),
                max_file_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://admin.pragxi.com".to_string()],
            },
            enrollment: EnrollmentConfig {
                generated_password_length: 16,
                compensation_max_attempts: 5,
                compensation_initial_backoff_ms: 250,
                compensation_max_backoff_ms: 8_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
