use super::schema::Config;
use crate::dashboard::parse_window;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (i, entry) in config.data.iter().enumerate() {
        if entry.trim().is_empty() {
            errors.push(format!("data[{}]: must not be empty", i));
        } else if let Err(e) = glob::Pattern::new(entry) {
            errors.push(format!("data[{}]: invalid pattern '{}' - {}", i, entry, e));
        }
    }

    if let Some(ref dashboard) = config.dashboard {
        if let Some(ref window) = dashboard.window {
            if let Err(e) = parse_window(window) {
                errors.push(format!(
                    "dashboard.window: invalid '{}' - {}",
                    window, e
                ));
            }
        }
        if let Some(ref trend) = dashboard.trend {
            if let Err(e) = parse_window(trend) {
                errors.push(format!("dashboard.trend: invalid '{}' - {}", trend, e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
