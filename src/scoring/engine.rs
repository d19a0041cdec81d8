use super::status::Status;
use crate::checkin::CheckIn;
use serde::Serialize;

pub const MAX_SEVERITY: u8 = 10;
pub const MAX_RISK_SCORE: f64 = 10.0;

const MISSED_MEDS_PENALTY: f64 = 1.5;
const SHORT_SLEEP_PENALTY: f64 = 1.0; // under 5h
const LOW_SLEEP_PENALTY: f64 = 0.5; // 5h up to 7h

/// A check-in together with its derived scores.
///
/// Only [`classify`] builds one, so the derived fields always agree with the
/// check-in they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCheckIn {
    #[serde(flatten)]
    check_in: CheckIn,
    symptom_score: f64,
    risk_score: f64,
    status: Status,
}

impl ScoredCheckIn {
    pub fn check_in(&self) -> &CheckIn {
        &self.check_in
    }

    pub fn symptom_score(&self) -> f64 {
        self.symptom_score
    }

    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn into_check_in(self) -> CheckIn {
        self.check_in
    }
}

#[derive(Debug, Clone)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Medication", "Sleep"
    pub description: String, // e.g. "missed -> +1.5", "6h -> +0.5"
    pub before: f64,
    pub after: f64,
}

/// Step-by-step account of how a risk score was reached.
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub symptom_score: f64,
    pub factors: Vec<FactorContribution>,
    pub raw: f64,
    pub clamped: bool,
    pub risk_score: f64,
    pub status: Status,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Severities above 10 count as 10.
fn effective_severity(value: u8) -> u8 {
    value.min(MAX_SEVERITY)
}

/// Negative or non-finite hours count as no sleep.
fn effective_sleep_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

pub fn meds_penalty(meds_taken: bool) -> f64 {
    if meds_taken {
        0.0
    } else {
        MISSED_MEDS_PENALTY
    }
}

pub fn sleep_penalty(sleep_hours: f64) -> f64 {
    let hours = effective_sleep_hours(sleep_hours);
    if hours < 5.0 {
        SHORT_SLEEP_PENALTY
    } else if hours < 7.0 {
        LOW_SLEEP_PENALTY
    } else {
        0.0
    }
}

/// Mean severity of the eight symptoms, rounded to one decimal.
pub fn compute_symptom_score(check_in: &CheckIn) -> f64 {
    let symptoms = check_in.symptoms();
    let total: u32 = symptoms
        .iter()
        .map(|&s| u32::from(effective_severity(s)))
        .sum();
    round_one_decimal(f64::from(total) / symptoms.len() as f64)
}

/// Symptom score plus medication and sleep penalties, rounded to one decimal
/// and capped at 10.
pub fn compute_risk_score(check_in: &CheckIn) -> f64 {
    let raw = compute_symptom_score(check_in)
        + meds_penalty(check_in.meds_taken)
        + sleep_penalty(check_in.sleep_hours);
    round_one_decimal(raw).min(MAX_RISK_SCORE)
}

pub fn compute_status(risk_score: f64) -> Status {
    Status::from_risk(risk_score)
}

pub fn classify(check_in: CheckIn) -> ScoredCheckIn {
    let symptom_score = compute_symptom_score(&check_in);
    let risk_score = compute_risk_score(&check_in);
    let status = compute_status(risk_score);
    ScoredCheckIn {
        check_in,
        symptom_score,
        risk_score,
        status,
    }
}

/// Score every check-in independently.
pub fn score_all<I>(check_ins: I) -> Vec<ScoredCheckIn>
where
    I: IntoIterator<Item = CheckIn>,
{
    check_ins.into_iter().map(classify).collect()
}

pub fn explain(check_in: &CheckIn) -> ScoreBreakdown {
    let symptom_score = compute_symptom_score(check_in);
    let mut score = symptom_score;
    let mut factors = Vec::new();

    let before = score;
    let penalty = meds_penalty(check_in.meds_taken);
    score += penalty;
    factors.push(FactorContribution {
        label: "Medication".to_string(),
        description: if check_in.meds_taken {
            "taken -> +0".to_string()
        } else {
            format!("missed -> {:+}", penalty)
        },
        before,
        after: score,
    });

    let before = score;
    let penalty = sleep_penalty(check_in.sleep_hours);
    score += penalty;
    factors.push(FactorContribution {
        label: "Sleep".to_string(),
        description: format!("{}h -> {:+}", check_in.sleep_hours, penalty),
        before,
        after: score,
    });

    let rounded = round_one_decimal(score);
    let risk_score = rounded.min(MAX_RISK_SCORE);

    ScoreBreakdown {
        symptom_score,
        factors,
        raw: score,
        clamped: rounded > MAX_RISK_SCORE,
        risk_score,
        status: compute_status(risk_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(symptoms: [u8; 8], meds_taken: bool, sleep_hours: f64) -> CheckIn {
        let mut c = CheckIn::new("p1", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .with_symptoms(symptoms);
        c.meds_taken = meds_taken;
        c.sleep_hours = sleep_hours;
        c
    }

    #[test]
    fn test_symptom_score_uniform() {
        assert_eq!(compute_symptom_score(&sample([4; 8], true, 8.0)), 4.0);
        assert_eq!(compute_symptom_score(&sample([0; 8], true, 8.0)), 0.0);
        assert_eq!(compute_symptom_score(&sample([10; 8], true, 8.0)), 10.0);
    }

    #[test]
    fn test_symptom_score_rounds_half_up() {
        // mean 1.75 -> 1.8
        let c = sample([3, 4, 2, 2, 0, 1, 0, 2], true, 8.0);
        assert_eq!(compute_symptom_score(&c), 1.8);
    }

    #[test]
    fn test_symptom_score_equals_rounded_mean_for_all_totals() {
        // Every total from 0 to 80 is reachable; the score only depends on it.
        for total in 0u8..=80 {
            let mut symptoms = [0u8; 8];
            let mut remaining = total;
            for slot in symptoms.iter_mut() {
                let v = remaining.min(10);
                *slot = v;
                remaining -= v;
            }
            let expected = (f64::from(total) / 8.0 * 10.0).round() / 10.0;
            assert_eq!(compute_symptom_score(&sample(symptoms, true, 8.0)), expected);
        }
    }

    #[test]
    fn test_meds_and_sleep_penalties() {
        assert_eq!(meds_penalty(true), 0.0);
        assert_eq!(meds_penalty(false), 1.5);
        assert_eq!(sleep_penalty(0.0), 1.0);
        assert_eq!(sleep_penalty(4.9), 1.0);
        assert_eq!(sleep_penalty(5.0), 0.5);
        assert_eq!(sleep_penalty(6.9), 0.5);
        assert_eq!(sleep_penalty(7.0), 0.0);
        assert_eq!(sleep_penalty(12.0), 0.0);
    }

    #[test]
    fn test_risk_follow_up_boundary() {
        // symptom 2.5 + missed meds 1.5 + 6h sleep 0.5 = 4.5
        let c = sample([2, 3, 2, 3, 2, 3, 2, 3], false, 6.0);
        assert_eq!(compute_symptom_score(&c), 2.5);
        assert_eq!(compute_risk_score(&c), 4.5);
        assert_eq!(classify(c).status(), Status::NeedsFollowUp);
    }

    #[test]
    fn test_risk_clamps_to_ten() {
        // 10 + 1.5 + 1 = 12.5 -> 10
        let c = sample([10; 8], false, 3.0);
        assert_eq!(compute_risk_score(&c), 10.0);
        let scored = classify(c);
        assert_eq!(scored.risk_score(), 10.0);
        assert_eq!(scored.status(), Status::Escalated);
    }

    #[test]
    fn test_risk_exact_thresholds() {
        // 4.0: symptom 4, meds taken, good sleep
        let c = sample([4; 8], true, 8.0);
        assert_eq!(compute_risk_score(&c), 4.0);
        assert_eq!(classify(c).status(), Status::NeedsFollowUp);

        // 7.0: symptom 5.5 + 1.5
        let c = sample([5, 6, 5, 6, 5, 6, 5, 6], false, 8.0);
        assert_eq!(compute_risk_score(&c), 7.0);
        assert_eq!(classify(c).status(), Status::NeedsFollowUp);

        // 7.1: symptom 6.1 (49/8 = 6.125) + 1.0 short sleep
        let c = sample([7, 6, 6, 6, 6, 6, 6, 6], true, 4.0);
        assert_eq!(compute_symptom_score(&c), 6.1);
        assert_eq!(compute_risk_score(&c), 7.1);
        assert_eq!(classify(c).status(), Status::Escalated);
    }

    #[test]
    fn test_risk_within_bounds() {
        for severity in 0..=10u8 {
            for &meds in &[true, false] {
                for &sleep in &[0.0, 4.5, 5.0, 6.5, 7.0, 14.0] {
                    let risk = compute_risk_score(&sample([severity; 8], meds, sleep));
                    assert!((0.0..=10.0).contains(&risk), "risk {} out of range", risk);
                }
            }
        }
    }

    #[test]
    fn test_risk_monotonic_in_each_symptom() {
        let base = [3, 1, 4, 1, 5, 9, 2, 6];
        for field in 0..8 {
            let mut previous = f64::MIN;
            for value in 0..=10u8 {
                let mut symptoms = base;
                symptoms[field] = value;
                let risk = compute_risk_score(&sample(symptoms, false, 6.0));
                assert!(risk >= previous, "field {} value {}", field, value);
                previous = risk;
            }
        }
    }

    #[test]
    fn test_classify_idempotent() {
        let c = sample([3, 4, 2, 2, 0, 1, 0, 2], false, 5.5);
        let first = classify(c.clone());
        let second = classify(c);
        assert_eq!(first, second);

        let rescored = classify(first.clone().into_check_in());
        assert_eq!(first, rescored);
    }

    #[test]
    fn test_out_of_range_inputs_are_coerced() {
        // Severities above 10 count as 10
        let c = sample([200; 8], true, 8.0);
        assert_eq!(compute_symptom_score(&c), 10.0);

        // Negative and NaN sleep count as no sleep
        assert_eq!(sleep_penalty(-3.0), 1.0);
        assert_eq!(sleep_penalty(f64::NAN), 1.0);
        let c = sample([0; 8], true, f64::NAN);
        assert_eq!(compute_risk_score(&c), 1.0);
    }

    #[test]
    fn test_score_all_independent() {
        let rows = score_all(vec![
            sample([0; 8], true, 8.0),
            sample([10; 8], false, 2.0),
            sample([4; 8], true, 8.0),
        ]);
        let statuses: Vec<Status> = rows.iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses,
            vec![Status::Normal, Status::Escalated, Status::NeedsFollowUp]
        );
    }

    #[test]
    fn test_explain_matches_classify() {
        let c = sample([5, 5, 4, 3, 1, 2, 1, 3], false, 6.0);
        let breakdown = explain(&c);
        let scored = classify(c);

        assert_eq!(breakdown.symptom_score, scored.symptom_score());
        assert_eq!(breakdown.risk_score, scored.risk_score());
        assert_eq!(breakdown.status, scored.status());
        assert_eq!(breakdown.factors.len(), 2);
        assert_eq!(breakdown.factors[0].label, "Medication");
        assert_eq!(breakdown.factors[0].after - breakdown.factors[0].before, 1.5);
        assert!(!breakdown.clamped);
    }

    #[test]
    fn test_explain_reports_clamp() {
        let breakdown = explain(&sample([10; 8], false, 3.0));
        assert!(breakdown.clamped);
        assert_eq!(breakdown.raw, 12.5);
        assert_eq!(breakdown.risk_score, 10.0);
    }

    #[test]
    fn test_scored_json_is_flat() {
        let scored = classify(sample([4; 8], true, 8.0));
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["patient_id"], "p1");
        assert_eq!(value["fatigue"], 4);
        assert_eq!(value["symptom_score"], 4.0);
        assert_eq!(value["risk_score"], 4.0);
        assert_eq!(value["status"], "Needs Follow-up");
    }
}
