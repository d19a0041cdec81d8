use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Names of the eight tracked symptoms, in the order returned by [`CheckIn::symptoms`].
pub const SYMPTOM_FIELDS: [&str; 8] = [
    "fatigue",
    "breathlessness",
    "cough",
    "pain",
    "nausea",
    "dizziness",
    "swelling",
    "anxiety",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Appetite {
    #[default]
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mobility {
    #[default]
    Normal,
    Reduced,
}

impl FromStr for Appetite {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Appetite::Normal),
            "low" => Ok(Appetite::Low),
            _ => bail!("Appetite must be 'normal' or 'low': {}", s),
        }
    }
}

impl FromStr for Mobility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mobility::Normal),
            "reduced" => Ok(Mobility::Reduced),
            _ => bail!("Mobility must be 'normal' or 'reduced': {}", s),
        }
    }
}

impl fmt::Display for Appetite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Appetite::Normal => write!(f, "Normal"),
            Appetite::Low => write!(f, "Low"),
        }
    }
}

impl fmt::Display for Mobility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mobility::Normal => write!(f, "Normal"),
            Mobility::Reduced => write!(f, "Reduced"),
        }
    }
}

/// Optional readings from home monitoring devices. Every field is independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceReadings {
    /// Blood oxygen saturation, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp_systolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp_diastolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Blood glucose, mg/dL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_mgdl: Option<f64>,
}

impl DeviceReadings {
    pub fn is_empty(&self) -> bool {
        self.spo2.is_none()
            && self.bp_systolic.is_none()
            && self.bp_diastolic.is_none()
            && self.weight_kg.is_none()
            && self.glucose_mgdl.is_none()
    }
}

/// One patient's self-reported check-in for a single day.
///
/// Check-ins are immutable once recorded. Scores are never stored with them;
/// any `symptom_score`/`risk_score`/`status` fields present in a data file are
/// ignored on load and recomputed by [`crate::scoring::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patient_id: String,
    pub date: NaiveDate,

    #[serde(default, deserialize_with = "deserialize_severity")]
    pub fatigue: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub breathlessness: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub cough: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub pain: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub nausea: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub dizziness: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub swelling: u8,
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub anxiety: u8,

    #[serde(default, deserialize_with = "deserialize_hours")]
    pub sleep_hours: f64,
    #[serde(default = "default_meds_taken", deserialize_with = "deserialize_meds_taken")]
    pub meds_taken: bool,
    #[serde(default)]
    pub appetite: Appetite,
    #[serde(default)]
    pub mobility: Mobility,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<DeviceReadings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CheckIn {
    /// A symptom-free check-in with medication taken and no sleep recorded.
    pub fn new(patient_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            patient_id: patient_id.into(),
            date,
            fatigue: 0,
            breathlessness: 0,
            cough: 0,
            pain: 0,
            nausea: 0,
            dizziness: 0,
            swelling: 0,
            anxiety: 0,
            sleep_hours: 0.0,
            meds_taken: true,
            appetite: Appetite::Normal,
            mobility: Mobility::Normal,
            devices: None,
            notes: None,
        }
    }

    /// Symptom severities in [`SYMPTOM_FIELDS`] order.
    pub fn symptoms(&self) -> [u8; 8] {
        [
            self.fatigue,
            self.breathlessness,
            self.cough,
            self.pain,
            self.nausea,
            self.dizziness,
            self.swelling,
            self.anxiety,
        ]
    }

    /// Set all eight severities at once, in [`SYMPTOM_FIELDS`] order.
    pub fn with_symptoms(mut self, values: [u8; 8]) -> Self {
        let [fatigue, breathlessness, cough, pain, nausea, dizziness, swelling, anxiety] = values;
        self.fatigue = fatigue;
        self.breathlessness = breathlessness;
        self.cough = cough;
        self.pain = pain;
        self.nausea = nausea;
        self.dizziness = dizziness;
        self.swelling = swelling;
        self.anxiety = anxiety;
        self
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

fn default_meds_taken() -> bool {
    true
}

/// Accepts whole numbers (`3` or `3.0`) and `null`, which counts as 0.
fn deserialize_severity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(0),
        Some(v) if v.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&v) => Ok(v as u8),
        Some(v) => Err(serde::de::Error::custom(format!(
            "invalid symptom severity {}: expected a whole number from 0 to 10",
            v
        ))),
    }
}

fn deserialize_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn deserialize_meds_taken<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDate>,
}

/// On-disk container for patients and their check-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub version: u32,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
}

impl Default for DataFile {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFile {
    /// Create a new empty data file with version 1
    pub fn new() -> Self {
        Self {
            version: super::storage::DATA_FILE_VERSION,
            patients: Vec::new(),
            check_ins: Vec::new(),
        }
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }
}
