use super::engine::MAX_SEVERITY;
use crate::checkin::{CheckIn, DeviceReadings, SYMPTOM_FIELDS};
use thiserror::Error;

const MAX_SLEEP_HOURS: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("patient_id: must not be empty")]
    MissingPatientId,

    #[error("{field}: severity {value} is above the maximum of 10")]
    SeverityOutOfRange { field: &'static str, value: u8 },

    #[error("sleep_hours: {0} is not a number of hours between 0 and 24")]
    SleepHoursOutOfRange(f64),

    #[error("devices.{field}: {value} is not {expected}")]
    InvalidDeviceReading {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("devices: diastolic pressure {diastolic} exceeds systolic {systolic}")]
    DiastolicAboveSystolic { systolic: f64, diastolic: f64 },
}

/// Every problem found in one check-in.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid check-in: {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate a check-in before it is recorded.
/// Returns all validation errors at once (not just the first).
///
/// Scoring never requires this: [`super::classify`] coerces out-of-range
/// values instead of failing.
pub fn validate_check_in(check_in: &CheckIn) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if check_in.patient_id.trim().is_empty() {
        errors.push(ValidationError::MissingPatientId);
    }

    for (field, value) in SYMPTOM_FIELDS.into_iter().zip(check_in.symptoms()) {
        if value > MAX_SEVERITY {
            errors.push(ValidationError::SeverityOutOfRange { field, value });
        }
    }

    let sleep = check_in.sleep_hours;
    if !sleep.is_finite() || !(0.0..=MAX_SLEEP_HOURS).contains(&sleep) {
        errors.push(ValidationError::SleepHoursOutOfRange(sleep));
    }

    if let Some(ref devices) = check_in.devices {
        validate_devices(devices, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn validate_devices(devices: &DeviceReadings, errors: &mut Vec<ValidationError>) {
    if let Some(spo2) = devices.spo2 {
        if !spo2.is_finite() || !(0.0..=100.0).contains(&spo2) {
            errors.push(ValidationError::InvalidDeviceReading {
                field: "spo2",
                value: spo2,
                expected: "a percentage from 0 to 100",
            });
        }
    }

    let positive = [
        ("bp_systolic", devices.bp_systolic),
        ("bp_diastolic", devices.bp_diastolic),
        ("weight_kg", devices.weight_kg),
        ("glucose_mgdl", devices.glucose_mgdl),
    ];
    for (field, reading) in positive {
        if let Some(value) = reading {
            if !value.is_finite() || value <= 0.0 {
                errors.push(ValidationError::InvalidDeviceReading {
                    field,
                    value,
                    expected: "a positive number",
                });
            }
        }
    }

    if let (Some(systolic), Some(diastolic)) = (devices.bp_systolic, devices.bp_diastolic) {
        if diastolic > systolic {
            errors.push(ValidationError::DiastolicAboveSystolic {
                systolic,
                diastolic,
            });
        }
    }
}
