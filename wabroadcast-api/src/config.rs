use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:5173".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            database: None,
            import: ImportConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    /// Most numbers a single bulk import may admit
    #[serde(default = "default_import_limit")]
    pub limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            limit: default_import_limit(),
        }
    }
}

fn default_import_limit() -> usize {
    contact_import::DEFAULT_IMPORT_LIMIT
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WhatsAppConfig {
    /// Base URL of the WhatsApp automation bridge
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            session_id: default_session_id(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8002".to_string()
}

fn default_session_id() -> String {
    "wabroadcast-session".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

const DEFAULT_CONFIG: &str = r#"
[cors]
allowed_origins = ["http://localhost:5173"]

[server]
host = "127.0.0.1"
port = 8080

[database]
# path = "/var/lib/wabroadcast/contacts.sqlite3"

[import]
limit = 1000

[whatsapp]
# Sidecar wrapping the WhatsApp automation client
bridge_url = "http://127.0.0.1:8002"
session_id = "wabroadcast-session"
request_timeout_secs = 30
"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_from(get_config_path())
    }

    /// Loads `config_path`, writing the default file first if it is missing.
    /// `WABROADCAST__SECTION__KEY` environment variables override the file.
    pub fn load_from(config_path: PathBuf) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("WABROADCAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn bind_address(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database
            .as_ref()
            .and_then(|db| db.path.as_deref())
            .map(Path::new)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("wabroadcast").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
