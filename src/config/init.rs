use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use super::schema::{DEFAULT_TREND, DEFAULT_WINDOW};
use super::{get_config_path, validate_config, Config, DashboardConfig};
use crate::dashboard::parse_window;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn prompt_window(message: &str, default: &str) -> Result<String> {
    loop {
        let input = prompt_with_default(message, default)?;
        match parse_window(&input) {
            Ok(_) => return Ok(input),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Serialize `config` to `path` atomically.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Err(errors) = validate_config(config) {
        anyhow::bail!("Refusing to write invalid config: {}", errors.join("; "));
    }

    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Run the interactive init wizard to create a config file.
///
/// With `accept_defaults`, nothing is asked: the config points at
/// `~/.config/checkin-triage/checkins.json` with default windows.
pub fn run_init_wizard(
    default_path: Option<PathBuf>,
    accept_defaults: bool,
    force: bool,
) -> Result<PathBuf> {
    let config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    let default_data = "~/.config/checkin-triage/checkins.json";

    let config = if accept_defaults {
        Config {
            data: vec![default_data.to_string()],
            dashboard: Some(DashboardConfig::default()),
        }
    } else {
        println!();
        println!("Check-in Triage Configuration");
        println!("=============================");
        println!();
        println!("Check-ins are read from JSON or YAML data files. Globs such as");
        println!("'~/health/*.json' are allowed; add as many as you need.");

        let mut data = vec![prompt_with_default("Data file", default_data)?];
        while prompt_yes_no("Add another data file?", false)? {
            let entry = prompt("  Data file or glob: ")?;
            if !entry.is_empty() {
                data.push(entry);
            }
        }

        println!();
        println!("The dashboard summarizes a recent window (check-in rate, flagged");
        println!("check-ins, average symptom score) and a longer per-day trend.");
        let window = prompt_window("KPI window", DEFAULT_WINDOW)?;
        let trend = prompt_window("Trend window", DEFAULT_TREND)?;

        Config {
            data,
            dashboard: Some(DashboardConfig {
                window: Some(window),
                trend: Some(trend),
            }),
        }
    };

    let force = if config_path.exists() && !force && !accept_defaults {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            anyhow::bail!("Aborted: kept existing config at {}", config_path.display());
        }
        true
    } else {
        force
    };

    write_config(&config_path, &config, force)?;
    Ok(config_path)
}
