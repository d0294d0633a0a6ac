use crate::core::ConfigProvider;
use crate::domain::model::{NavigationPaths, SegmentFormat, UnmappedPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 完整設定檔；每個區段都有預設值，空檔案也合法
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub resolution: ResolutionConfig,
    pub format: SegmentFormat,
    pub navigation: NavigationPaths,
    pub processing: ProcessingConfig,
    pub persistence: Option<PersistenceConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub mapping_file: String,
    pub input_dir: String,
    pub output_dir: String,
    pub output_suffix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mapping_file: "mapping.json".to_string(),
            input_dir: "../data".to_string(),
            output_dir: "../output_data".to_string(),
            output_suffix: crate::core::etl::DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub unmapped_policy: UnmappedPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub concurrency: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub database_url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            EtlError::config(format!(
                "cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| EtlError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${DATABASE_URL})，找不到的變數保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| EtlError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn max_connections(&self) -> u32 {
        self.persistence
            .as_ref()
            .and_then(|p| p.max_connections)
            .unwrap_or(5)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.mapping_file", &self.paths.mapping_file)?;
        validation::validate_path("paths.input_dir", &self.paths.input_dir)?;
        validation::validate_path("paths.output_dir", &self.paths.output_dir)?;

        validation::validate_positive_number(
            "processing.concurrency",
            self.processing.concurrency,
            1,
        )?;

        validation::validate_non_empty_string("format.coded_tag", &self.format.coded_tag)?;
        validation::validate_non_empty_string("format.message_field", &self.format.message_field)?;
        validation::validate_distinct_chars(
            "format.composite_delimiter",
            self.format.marker,
            self.format.composite_delimiter,
        )?;

        validation::validate_document_path("navigation.member_id", &self.navigation.member_id)?;
        if self.navigation.segment_lists.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "navigation.segment_lists".to_string(),
            });
        }
        for path in &self.navigation.segment_lists {
            validation::validate_document_path("navigation.segment_lists", path)?;
        }

        if let Some(persistence) = &self.persistence {
            validation::validate_non_empty_string(
                "persistence.database_url",
                &persistence.database_url,
            )?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn mapping_path(&self) -> &str {
        &self.paths.mapping_file
    }

    fn input_dir(&self) -> &str {
        &self.paths.input_dir
    }

    fn output_dir(&self) -> &str {
        &self.paths.output_dir
    }

    fn output_suffix(&self) -> &str {
        &self.paths.output_suffix
    }

    fn concurrency(&self) -> usize {
        self.processing.concurrency
    }

    fn unmapped_policy(&self) -> UnmappedPolicy {
        self.resolution.unmapped_policy
    }

    fn segment_format(&self) -> &SegmentFormat {
        &self.format
    }

    fn navigation(&self) -> &NavigationPaths {
        &self.navigation
    }

    fn database_url(&self) -> Option<&str> {
        self.persistence.as_ref().map(|p| p.database_url.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
