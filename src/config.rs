// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use lexicards_core::SchedulerConfig;
use lexicards_core::error::ErrorReport;
use lexicards_core::error::Fallible;
use lexicards_core::error::fail;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE: &str = "lexicards.db";

/// The application configuration file. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub search: SearchSection,
    pub scheduler: SchedulerConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub database: PathBuf,
    /// Memoise card lookups in front of the database.
    pub cache: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            cache: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    pub limit: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            limit: lexicards_core::search::DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Fallible<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!(
                        "config file does not exist: {}",
                        path.display()
                    ));
                }
                let text = read_to_string(path)?;
                Self::parse(&text)
                    .map_err(|e| ErrorReport::new(format!("{}: {e}", path.display())))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.server.host.trim().is_empty() {
            return fail("server.host must not be empty");
        }
        if self.search.limit == 0 {
            return fail("search.limit must be at least 1");
        }
        self.scheduler.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_empty_file_is_defaults() -> Fallible<()> {
        assert_eq!(AppConfig::parse("")?, AppConfig::default());
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.database, PathBuf::from("lexicards.db"));
        assert!(config.storage.cache);
        assert_eq!(config.search.limit, 10);
        Ok(())
    }

    #[test]
    fn test_partial_sections() -> Fallible<()> {
        let config = AppConfig::parse(
            r#"
            [server]
            port = 9090

            [storage]
            cache = false

            [scheduler]
            graduation_stability = 3.5
            "#,
        )?;
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert!(!config.storage.cache);
        assert_eq!(config.scheduler.graduation_stability, 3.5);
        assert_eq!(config.scheduler.target_recall, 0.9);
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(AppConfig::parse("[server]\nhots = \"x\"").is_err());
        assert!(AppConfig::parse("[colour]\nx = 1").is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::parse("[search]\nlimit = 0").is_err());
        assert!(AppConfig::parse("[scheduler]\ntarget_recall = 1.5").is_err());
    }

    #[test]
    fn test_load() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("lexicards.toml");
        write(&path, "[search]\nlimit = 3\n")?;
        assert_eq!(AppConfig::load(Some(&path))?.search.limit, 3);
        assert_eq!(AppConfig::load(None)?, AppConfig::default());
        let missing = dir.path().join("missing.toml");
        let err = AppConfig::load(Some(&missing)).err().unwrap();
        assert!(err.to_string().contains("config file does not exist"));
        Ok(())
    }
}
