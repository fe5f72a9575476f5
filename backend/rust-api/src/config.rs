use serde::Deserialize;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub storage: ObjectStorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorageSettings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Key prefix under which rendered certificates are stored.
    pub certificates_prefix: String,
    /// Bucket key of the fixed certificate template PDF.
    pub template_key: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env_name = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| {
                eprintln!("WARNING: MONGO_URI not set, using local MongoDB");
                "mongodb://localhost:27017".to_string()
            });

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "anchor_lms".to_string());

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| {
                if env_name == "prod" {
                    panic!("FATAL: JWT_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let storage = ObjectStorageSettings {
            bucket: settings
                .get_string("storage.bucket")
                .or_else(|_| env::var("STORAGE_BUCKET"))
                .unwrap_or_else(|_| "anchor-lms".to_string()),
            region: settings
                .get_string("storage.region")
                .or_else(|_| env::var("STORAGE_REGION"))
                .unwrap_or_else(|_| "ru-central1".to_string()),
            endpoint: settings
                .get_string("storage.endpoint")
                .ok()
                .or_else(|| env::var("STORAGE_ENDPOINT").ok()),
            access_key: settings
                .get_string("storage.access_key")
                .or_else(|_| env::var("STORAGE_ACCESS_KEY"))
                .unwrap_or_else(|_| {
                    if env_name == "prod" {
                        panic!("FATAL: STORAGE_ACCESS_KEY must be set in production!");
                    }
                    eprintln!("WARNING: STORAGE_ACCESS_KEY not set (dev mode only!)");
                    String::new()
                }),
            secret_key: settings
                .get_string("storage.secret_key")
                .or_else(|_| env::var("STORAGE_SECRET_KEY"))
                .unwrap_or_else(|_| {
                    if env_name == "prod" {
                        panic!("FATAL: STORAGE_SECRET_KEY must be set in production!");
                    }
                    eprintln!("WARNING: STORAGE_SECRET_KEY not set (dev mode only!)");
                    String::new()
                }),
            certificates_prefix: settings
                .get_string("storage.certificates_prefix")
                .or_else(|_| env::var("STORAGE_CERTIFICATES_PREFIX"))
                .unwrap_or_else(|_| "certificates".to_string()),
            template_key: settings
                .get_string("storage.template_key")
                .or_else(|_| env::var("STORAGE_TEMPLATE_KEY"))
                .unwrap_or_else(|_| "templates/anchor-certificate-template.pdf".to_string()),
        };

        Ok(Config {
            bind_addr,
            mongo_uri,
            mongo_database,
            jwt_secret,
            storage,
        })
    }
}
