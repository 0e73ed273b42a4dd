use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DaemonError, Result};

const DEFAULT_CONFIG_ENV: &str = "CATALOGD_CONFIG";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Flat port setting from older config files; `server.port` wins.
    pub port: Option<String>,
    pub storage: StorageSettings,
    pub server: ServerSettings,
    pub admin: AdminSettings,
    pub site: SiteSettings,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: Some(String::from("info")),
            log_file: None,
            port: None,
            storage: StorageSettings::default(),
            server: ServerSettings::default(),
            admin: AdminSettings::default(),
            site: SiteSettings::default(),
        }
    }
}

impl DaemonConfig {
    pub fn from_sources(cli_path: Option<&str>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let env_path = std::env::var(DEFAULT_CONFIG_ENV).ok();

        if let Some(path) = cli_path {
            if path.is_empty() {
                return Err(DaemonError::Config(
                    "configuration path must not be empty".into(),
                ));
            }
        }

        let config = if let Some(path) = cli_path {
            Self::load_from_path(path)?
        } else if let Some(path) = env_path.as_deref().filter(|p| !p.is_empty()) {
            Self::load_from_path(path)?
        } else {
            let mut cfg = Self::default();
            cfg.normalize_paths(&cwd);
            cfg
        };

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let raw = fs::read_to_string(&absolute_path)?;
        let mut config: DaemonConfig = toml::from_str(&raw)?;
        let base = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.normalize_paths(&base);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_file.as_os_str().is_empty() {
            return Err(DaemonError::Config(
                "storage.data_file must not be empty".into(),
            ));
        }

        for (name, limit) in [
            ("server.concurrency_limit", self.server.concurrency_limit),
            ("server.body_limit", self.server.body_limit),
            ("server.worker_threads", self.server.worker_threads),
        ] {
            if limit == Some(0) {
                return Err(DaemonError::Config(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        self.resolved_port()?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    /// Nested `server.port`, then the flat `port`, then 8080.
    pub fn resolved_port(&self) -> Result<u16> {
        if let Some(port) = self.server.port {
            return Ok(port);
        }
        match self.port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => raw
                .parse()
                .map_err(|err| DaemonError::Config(format!("invalid port '{raw}': {err}"))),
            None => Ok(DEFAULT_PORT),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr: IpAddr = self
            .server
            .bind_address
            .parse()
            .map_err(|err| DaemonError::Config(format!("invalid bind_address: {err}")))?;
        Ok(SocketAddr::new(addr, self.resolved_port()?))
    }

    fn normalize_paths(&mut self, base: &Path) {
        normalize_optional_path(&mut self.log_file, base);
        self.storage.normalize(base);
    }
}

fn normalize_optional_path(target: &mut Option<PathBuf>, base: &Path) {
    if let Some(path) = target {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_file: PathBuf,
    pub watch: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/sites.json"),
            watch: true,
        }
    }
}

impl StorageSettings {
    fn normalize(&mut self, base: &Path) {
        if self.data_file.is_relative() && !self.data_file.as_os_str().is_empty() {
            self.data_file = base.join(&self.data_file);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: Option<u16>,
    pub tcp_nodelay: bool,
    pub worker_threads: Option<usize>,
    pub concurrency_limit: Option<usize>,
    pub body_limit: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".into(),
            port: None,
            tcp_nodelay: true,
            worker_threads: None,
            concurrency_limit: None,
            body_limit: None,
        }
    }
}

impl ServerSettings {
    pub fn worker_threads(&self) -> Option<usize> {
        self.worker_threads
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Bearer token for the admin routes. Admin routes are closed when unset.
    pub token: Option<String>,
}

impl AdminSettings {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub copyright: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            copyright: "Site Catalog © 2024".into(),
        }
    }
}
