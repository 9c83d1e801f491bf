use crate::core::engine::ProgressPolicy;
use crate::core::modules::ModulePartition;
use crate::core::progression::SiblingPolicy;
use crate::core::verification::CheckTimings;
use crate::utils::error::{ProgressError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    pub verification: VerificationConfig,
    pub progression: ProgressionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub table: String,
    pub id_column: String,
    pub field: String,
    pub debounce_ms: u64,
    pub min_interval_ms: u64,
    pub freshness_seconds: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            table: "profiles".to_string(),
            id_column: "id".to_string(),
            field: "email_verified".to_string(),
            debounce_ms: 500,
            min_interval_ms: 2_000,
            freshness_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub module_partition: ModulePartition,
    pub sibling_policy: SiblingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProgressError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProgressError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timings(&self) -> CheckTimings {
        CheckTimings {
            debounce: Duration::from_millis(self.verification.debounce_ms),
            min_interval: Duration::from_millis(self.verification.min_interval_ms),
            freshness: Duration::from_secs(self.verification.freshness_seconds),
        }
    }

    pub fn policy(&self) -> ProgressPolicy {
        ProgressPolicy {
            module_partition: self.progression.module_partition,
            sibling_policy: self.progression.sibling_policy,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("backend.url", &self.backend.url)?;
        validation::validate_range("backend.timeout_seconds", self.backend.timeout_seconds, 1, 300)?;

        validation::validate_identifier("verification.table", &self.verification.table)?;
        validation::validate_identifier("verification.id_column", &self.verification.id_column)?;
        validation::validate_identifier("verification.field", &self.verification.field)?;
        validation::validate_range("verification.debounce_ms", self.verification.debounce_ms, 1, 60_000)?;
        validation::validate_range(
            "verification.freshness_seconds",
            self.verification.freshness_seconds,
            1,
            86_400,
        )?;

        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        Ok(())
    }
}
