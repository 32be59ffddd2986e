//! Report configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. The runner applies CLI flags on top of the loaded values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub orders_path: String,
    pub spend_path:  String,
    pub out_dir:     String,
    /// SQLite data mart. `None` skips the mart entirely.
    pub db_path: Option<String>,
    /// Round exported numbers. `None` writes shortest round-trip values.
    pub decimal_places: Option<usize>,
    pub write_json: bool,
    /// Cohorts with LTV:CAC below this are logged at warn level.
    pub ltv_cac_warning_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            orders_path: "data/orders_sample.csv".into(),
            spend_path:  "data/marketing_spend.csv".into(),
            out_dir:     "reports".into(),
            db_path:     None,
            decimal_places: None,
            write_json: true,
            ltv_cac_warning_threshold: 1.0,
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file.
    /// In tests, use ReportConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.ltv_cac_warning_threshold.is_finite() || self.ltv_cac_warning_threshold < 0.0 {
            anyhow::bail!(
                "ltv_cac_warning_threshold must be a non-negative number, got {}",
                self.ltv_cac_warning_threshold
            );
        }
        if let Some(places) = self.decimal_places {
            if places > 12 {
                anyhow::bail!("decimal_places must be at most 12, got {places}");
            }
        }
        Ok(())
    }

    /// Minimal config for tests: no mart, no rounding, JSON enabled.
    pub fn default_test() -> Self {
        Self {
            orders_path: String::new(),
            spend_path:  String::new(),
            out_dir:     String::new(),
            ..Self::default()
        }
    }
}
