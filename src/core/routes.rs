use crate::core::RouteRecord;
use crate::utils::error::{AppError, Result};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    Yaml,
    Json,
}

impl RouteFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(RouteFormat::Yaml),
            Some("json") => Ok(RouteFormat::Json),
            _ => Err(AppError::InvalidConfigValueError {
                field: "sources.path".to_string(),
                value: path.to_string(),
                reason: "Cannot infer route format; use a .yaml, .yml or .json file".to_string(),
            }),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(RouteFormat::Yaml),
            "json" => Ok(RouteFormat::Json),
            other => Err(AppError::InvalidConfigValueError {
                field: "sources.format".to_string(),
                value: other.to_string(),
                reason: "Supported formats: yaml, json".to_string(),
            }),
        }
    }
}

/// Path to destination URL mapping. Never mutated after it is built, so one
/// table can serve any number of concurrent requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Later records win when a path repeats.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RouteRecord>,
    {
        let routes = records
            .into_iter()
            .map(|record| (record.path, record.url))
            .collect();
        Self { routes }
    }

    pub fn from_map(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }

    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        Self::decode(data, RouteFormat::Yaml)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        Self::decode(data, RouteFormat::Json)
    }

    /// Decodes a list of `{path, url}` entries. A blank or null document
    /// yields an empty table.
    pub fn decode(data: &[u8], format: RouteFormat) -> Result<Self> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let records: Option<Vec<RouteRecord>> = match format {
            RouteFormat::Yaml => serde_yaml::from_slice(data)?,
            RouteFormat::Json => serde_json::from_slice(data)?,
        };

        let table = Self::build(records.unwrap_or_default());
        tracing::debug!("Decoded {} routes from {:?} document", table.len(), format);
        Ok(table)
    }

    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
