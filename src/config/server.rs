use crate::core::handlers::DEFAULT_FALLBACK_BODY;
use crate::core::routes::{RouteFormat, RouteTable};
use crate::core::Storage;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    validate_path, validate_route_path, validate_socket_addr, validate_url, Validate,
};
use clap::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Parser)]
#[command(name = "redirect_server")]
#[command(about = "Redirects request paths to URLs loaded from YAML/JSON route files")]
pub struct RedirectArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON route file, checked before every other source
    #[arg(long)]
    pub json_file: Option<String>,

    /// YAML route file, checked after the JSON file
    #[arg(long)]
    pub yaml_file: Option<String>,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Route documents in lookup order, most specific first.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Inline routes, consulted after every source.
    #[serde(default)]
    pub routes: HashMap<String, String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_body")]
    pub body: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            body: default_fallback_body(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    pub format: Option<String>,
}

impl SourceConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Explicit `format` wins over the file extension.
    pub fn route_format(&self) -> Result<RouteFormat> {
        match &self.format {
            Some(name) => RouteFormat::from_name(name),
            None => RouteFormat::from_path(&self.path),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_fallback_body() -> String {
    DEFAULT_FALLBACK_BODY.to_string()
}

impl ServerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// TOML file (when given) with command line flags applied on top. Flag
    /// sources go in front of the file's sources: JSON first, then YAML.
    pub fn from_args(args: &RedirectArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let flag_sources: Vec<SourceConfig> = [&args.json_file, &args.yaml_file]
            .into_iter()
            .flatten()
            .map(SourceConfig::new)
            .collect();
        config.sources.splice(0..0, flag_sources);

        if let Some(bind) = &args.bind {
            config.server.bind = bind.clone();
        }
        if args.log_json {
            config.logging.json = true;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        validate_socket_addr("server.bind", &self.server.bind)
    }

    /// One table per source in order, then the inline routes when present.
    pub async fn load_route_tables<S: Storage>(&self, storage: &S) -> Result<Vec<RouteTable>> {
        let mut tables = Vec::with_capacity(self.sources.len() + 1);

        for source in &self.sources {
            let format = source.route_format()?;
            let data = storage.read_file(&source.path).await?;
            let table = RouteTable::decode(&data, format)?;
            for path in table.paths() {
                validate_route_path(&source.path, path)?;
            }
            tracing::info!("Loaded {} routes from {}", table.len(), source.path);
            tables.push(table);
        }

        if !self.routes.is_empty() {
            tracing::info!("Loaded {} inline routes", self.routes.len());
            tables.push(RouteTable::from_map(self.routes.clone()));
        }

        Ok(tables)
    }

    pub fn validate_config(&self) -> Result<()> {
        self.bind_addr()?;

        for source in &self.sources {
            validate_path("sources.path", &source.path)?;
            source.route_format()?;
        }

        for (path, url) in &self.routes {
            validate_route_path("routes", path)?;
            validate_url("routes", url)?;
        }

        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
