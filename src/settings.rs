use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

const SETTINGS_FILE: &str = "settings.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "logs";

pub const TOKEN_ENV: &str = "SLACK_API_TOKEN";
pub const AUTHOR_ENV: &str = "SLACK_AUTHOR";
pub const MENTION_ENV: &str = "SLACK_MENTION";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default, rename = "exclude-channels")]
    pub exclude_channels: Vec<String>,
    #[serde(default, rename = "output-dir", skip_serializing_if = "String::is_empty")]
    pub output_dir: String,
    #[serde(default)]
    pub collect: CollectSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectSettings {
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> usize {
    1
}

impl Settings {
    /// Load `path`, or `settings.toml` from the working directory when no
    /// path is given. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(SETTINGS_FILE), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }

    /// Apply `SLACK_API_TOKEN`, `SLACK_AUTHOR` and `SLACK_MENTION`.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = value(TOKEN_ENV) {
            self.token = token.trim().to_string();
        }
        if let Some(author) = value(AUTHOR_ENV) {
            self.author = author.trim().to_string();
        }
        if let Some(mentions) = value(MENTION_ENV) {
            self.mentions = split_list(&mentions);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::MissingToken);
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        if self.output_dir.is_empty() {
            PathBuf::from(DEFAULT_OUTPUT_DIR)
        } else {
            PathBuf::from(&self.output_dir)
        }
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
