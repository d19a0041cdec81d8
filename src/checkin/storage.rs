use super::types::{CheckIn, DataFile};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DATA_FILE_VERSION: u32 = 1;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load patients and check-ins from a JSON (or `.yaml`/`.yml`) data file
///
/// If the file doesn't exist, returns a new empty data file.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_data_file(path: &Path) -> Result<DataFile> {
    if !path.exists() {
        debug!("Data file {} does not exist yet", path.display());
        return Ok(DataFile::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file at {}", path.display()))?;

    let data: DataFile = if is_yaml(path) {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse data file: invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse data file: invalid JSON in {}", path.display()))?
    };

    if data.version != DATA_FILE_VERSION {
        anyhow::bail!(
            "Unsupported data file version {} in {}",
            data.version,
            path.display()
        );
    }

    debug!(
        "Loaded {} patients and {} check-ins from {}",
        data.patients.len(),
        data.check_ins.len(),
        path.display()
    );

    Ok(data)
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !has_glob_chars(pattern) {
        return Ok(vec![crate::config::expand_home(pattern)]);
    }

    let expanded = crate::config::expand_home(pattern);
    let expanded = expanded.to_string_lossy();
    let mut paths = Vec::new();
    for entry in glob::glob(&expanded).with_context(|| format!("Invalid data file pattern '{}'", pattern))? {
        paths.push(entry.with_context(|| format!("Failed to read a match for '{}'", pattern))?);
    }
    paths.sort();

    if paths.is_empty() {
        warn!("Data file pattern '{}' matched no files", pattern);
    }
    Ok(paths)
}

/// Load and merge every data file named by `patterns` (plain paths or globs)
///
/// A plain path that does not exist is an error; a glob that matches
/// nothing only logs a warning.
///
/// Patients are deduplicated by id and check-ins by id when they carry one;
/// the first occurrence wins.
pub fn load_many<S: AsRef<str>>(patterns: &[S]) -> Result<DataFile> {
    let mut merged = DataFile::new();
    let mut seen_patients = HashSet::new();
    let mut seen_check_ins = HashSet::new();

    for pattern in patterns {
        for path in expand_pattern(pattern.as_ref())? {
            if !path.exists() {
                anyhow::bail!("Data file not found at {}", path.display());
            }
            let data = load_data_file(&path)?;

            for patient in data.patients {
                if seen_patients.insert(patient.id.clone()) {
                    merged.patients.push(patient);
                } else {
                    warn!("Duplicate patient '{}' in {}, keeping first", patient.id, path.display());
                }
            }

            for check_in in data.check_ins {
                let is_new = match &check_in.id {
                    Some(id) => seen_check_ins.insert(id.clone()),
                    None => true,
                };
                if is_new {
                    merged.check_ins.push(check_in);
                } else {
                    debug!("Skipping duplicate check-in {:?} in {}", check_in.id, path.display());
                }
            }
        }
    }

    Ok(merged)
}

/// Save a data file atomically
///
/// Uses atomic-write-file so a crash never leaves a half-written file behind.
/// Creates the parent directory if it doesn't exist.
pub fn save_data_file(path: &Path, data: &DataFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    if is_yaml(path) {
        let yaml = serde_saphyr::to_string(data)
            .map_err(|e| anyhow::anyhow!("Failed to serialize data file: {}", e))?;
        file.write_all(yaml.as_bytes())
            .context("Failed to write data file")?;
    } else {
        serde_json::to_writer_pretty(&mut file, data).context("Failed to serialize data file")?;
    }

    file.commit().context("Failed to save data file")?;

    Ok(())
}

/// Validate a new check-in and record it at the front of the data file
///
/// Assigns a fresh id when the check-in has none. When the file has a patient
/// roster, the check-in must belong to one of its patients.
pub fn append_check_in(path: &Path, mut check_in: CheckIn) -> Result<CheckIn> {
    crate::scoring::validate_check_in(&check_in)?;

    let mut data = load_data_file(path)?;

    if !data.patients.is_empty() && data.patient(&check_in.patient_id).is_none() {
        anyhow::bail!(
            "Unknown patient '{}' in {}",
            check_in.patient_id,
            path.display()
        );
    }

    if check_in.id.is_none() {
        check_in.id = Some(uuid::Uuid::new_v4().to_string());
    }

    data.check_ins.insert(0, check_in.clone());
    save_data_file(path, &data)?;

    debug!(
        "Recorded check-in {:?} for patient {} in {}",
        check_in.id,
        check_in.patient_id,
        path.display()
    );

    Ok(check_in)
}
