pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::UnmappedPolicy;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::{MonitoringConfig, PersistenceConfig, TomlConfig};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "eligibility-etl")]
#[command(about = "Resolve EB codes in EDI 271 eligibility JSON into normalized records")]
pub struct CliConfig {
    /// Process only this file (name inside the input directory)
    pub file: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Mapping definition (JSON or TOML)
    #[arg(long)]
    pub mapping: Option<String>,

    #[arg(long)]
    pub input_dir: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    /// How to handle codes missing from the mapping: strict | lenient
    #[arg(long)]
    pub unmapped: Option<UnmappedPolicy>,

    /// Documents processed in parallel
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Persist records to SQLite, e.g. sqlite://eligibility.db
    #[arg(long)]
    pub database_url: Option<String>,

    /// Log output: text | json
    #[arg(long, default_value = "text")]
    pub log_format: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 讀取 `--config` (若有)，再以命令列參數覆蓋
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(mapping) = &self.mapping {
            config.paths.mapping_file = mapping.clone();
        }
        if let Some(input_dir) = &self.input_dir {
            config.paths.input_dir = input_dir.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.paths.output_dir = output_dir.clone();
        }
        if let Some(policy) = self.unmapped {
            config.resolution.unmapped_policy = policy;
        }
        if let Some(concurrency) = self.concurrency {
            config.processing.concurrency = concurrency;
        }
        if let Some(database_url) = &self.database_url {
            let max_connections = config.persistence.as_ref().and_then(|p| p.max_connections);
            config.persistence = Some(PersistenceConfig {
                database_url: database_url.clone(),
                max_connections,
            });
        }
        if self.monitor {
            config.monitoring = Some(MonitoringConfig { enabled: true });
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "eligibility-etl",
            "AETNA-271.json",
            "--mapping",
            "eb.json",
            "--unmapped",
            "lenient",
            "--concurrency",
            "2",
            "--database-url",
            "sqlite://test.db",
            "--log-format",
            "JSON",
        ]);

        let config = cli.load_config().unwrap();

        assert_eq!(cli.file.as_deref(), Some("AETNA-271.json"));
        assert_eq!(config.mapping_path(), "eb.json");
        assert_eq!(config.input_dir(), "../data");
        assert_eq!(config.unmapped_policy(), UnmappedPolicy::Lenient);
        assert_eq!(config.concurrency(), 2);
        assert_eq!(config.database_url(), Some("sqlite://test.db"));
        assert!(cli.json_logs());
    }

    #[test]
    fn test_invalid_policy_flag_rejected() {
        let result = CliConfig::try_parse_from(["eligibility-etl", "--unmapped", "ignore"]);
        assert!(result.is_err());
    }
}
