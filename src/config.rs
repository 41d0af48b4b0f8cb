// ⚙️ Configuration - output locations, logging filter, server address
// Every field has a default, so an empty `{}` (or no file at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "EQUIEAT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "equieat.json";

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_packing_list_file() -> String {
    "Final_Packing_List.html".to_string()
}

fn default_reserve_report_file() -> String {
    "Reserve_Stock_Report.txt".to_string()
}

fn default_claim_stubs_file() -> String {
    "Claim_Stubs.html".to_string()
}

fn default_audit_log_file() -> String {
    "audit_log.html".to_string()
}

fn default_enabled_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_packing_list_file")]
    pub packing_list_file: String,
    #[serde(default = "default_reserve_report_file")]
    pub reserve_report_file: String,
    #[serde(default = "default_claim_stubs_file")]
    pub claim_stubs_file: String,
    #[serde(default = "default_audit_log_file")]
    pub audit_log_file: String,
    #[serde(default = "default_enabled_true")]
    pub audit_enabled: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            output_dir: default_output_dir(),
            packing_list_file: default_packing_list_file(),
            reserve_report_file: default_reserve_report_file(),
            claim_stubs_file: default_claim_stubs_file(),
            audit_log_file: default_audit_log_file(),
            audit_enabled: true,
            log_filter: default_log_filter(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Explicit path, else $EQUIEAT_CONFIG, else ./equieat.json if present
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Resolve and load; defaults when no file is found
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::from_file(path),
            None => Ok(AppConfig::default()),
        }
    }

    pub fn packing_list_path(&self) -> PathBuf {
        self.output_dir.join(&self.packing_list_file)
    }

    pub fn reserve_report_path(&self) -> PathBuf {
        self.output_dir.join(&self.reserve_report_file)
    }

    pub fn claim_stubs_path(&self) -> PathBuf {
        self.output_dir.join(&self.claim_stubs_file)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.audit_log_file)
    }
}
