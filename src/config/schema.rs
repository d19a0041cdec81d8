use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: &str = "7d";
pub const DEFAULT_TREND: &str = "30d";

/// Main configuration.
///
/// Example YAML:
/// ```yaml
/// data:
///   - ~/health/checkins.json
///   - ~/health/archive/*.json
/// dashboard:
///   window: 7d
///   trend: 30d
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Data files to read, as paths or glob patterns. `~` expands to the home directory.
    #[serde(default)]
    pub data: Vec<String>,

    #[serde(default)]
    pub dashboard: Option<DashboardConfig>,
}

/// Dashboard windows, written as durations in whole days ("7d", "2w")
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Window for the KPI cards (check-in rate, flagged count, average symptom score)
    #[serde(default)]
    pub window: Option<String>,

    /// Window for the per-day series
    #[serde(default)]
    pub trend: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            window: Some(DEFAULT_WINDOW.to_string()),
            trend: Some(DEFAULT_TREND.to_string()),
        }
    }
}

impl Config {
    /// Effective KPI window string, falling back to the default
    pub fn window(&self) -> &str {
        self.dashboard
            .as_ref()
            .and_then(|d| d.window.as_deref())
            .unwrap_or(DEFAULT_WINDOW)
    }

    /// Effective trend window string, falling back to the default
    pub fn trend(&self) -> &str {
        self.dashboard
            .as_ref()
            .and_then(|d| d.trend.as_deref())
            .unwrap_or(DEFAULT_TREND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.is_empty());
        assert_eq!(config.window(), "7d");
        assert_eq!(config.trend(), "30d");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            data: vec!["~/health/checkins.json".to_string()],
            dashboard: Some(DashboardConfig::default()),
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_dashboard_config() {
        let yaml = r#"
data:
  - checkins.json
dashboard:
  window: 14d
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.data, vec!["checkins.json".to_string()]);
        assert_eq!(config.window(), "14d");
        assert_eq!(config.trend(), "30d");
    }

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert!(config.data.is_empty());
        assert!(config.dashboard.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
data: []
queries: []
"#;
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }
}
