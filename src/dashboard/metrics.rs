use super::range::DateRange;
use crate::checkin::Patient;
use crate::scoring::{ScoredCheckIn, Status};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint<T> {
    pub date: NaiveDate,
    pub value: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary<'a> {
    pub today: NaiveDate,
    pub window: DateRange,
    pub trend: DateRange,
    pub check_ins_today: usize,
    pub window_check_ins: usize,
    /// Percentage of expected check-ins (one per patient per day) missing from the window
    pub missing_rate: f64,
    /// Window check-ins whose status is not Normal
    pub flagged: usize,
    pub avg_symptom_score: Option<f64>,
    pub check_ins_per_day: Vec<DailyPoint<usize>>,
    pub avg_risk_per_day: Vec<DailyPoint<Option<f64>>>,
    pub needs_follow_up: Vec<&'a ScoredCheckIn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterRow<'a> {
    pub patient: &'a Patient,
    pub latest: Option<&'a ScoredCheckIn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail<'a> {
    pub patient_id: String,
    pub latest: Option<&'a ScoredCheckIn>,
    /// Symptom score per check-in, oldest first
    pub symptom_trend: Vec<DailyPoint<f64>>,
    pub check_ins: usize,
    /// Check-ins submitted without notes
    pub missing_notes: usize,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(round_one_decimal(sum / count as f64))
    }
}

/// Most recent check-in per patient. The first one seen wins a same-day tie.
pub fn latest_per_patient(scored: &[ScoredCheckIn]) -> HashMap<&str, &ScoredCheckIn> {
    let mut latest: HashMap<&str, &ScoredCheckIn> = HashMap::new();
    for row in scored {
        let c = row.check_in();
        match latest.get(c.patient_id.as_str()) {
            Some(current) if current.check_in().date >= c.date => {}
            _ => {
                latest.insert(c.patient_id.as_str(), row);
            }
        }
    }
    latest
}

/// Latest check-in of every patient whose status is flagged, highest risk first
pub fn needs_follow_up(scored: &[ScoredCheckIn]) -> Vec<&ScoredCheckIn> {
    let mut rows: Vec<&ScoredCheckIn> = latest_per_patient(scored)
        .into_values()
        .filter(|r| r.status().is_flagged())
        .collect();

    rows.sort_by(|a, b| {
        // Primary: risk descending
        let risk_cmp = b
            .risk_score()
            .partial_cmp(&a.risk_score())
            .unwrap_or(Ordering::Equal);
        if risk_cmp != Ordering::Equal {
            return risk_cmp;
        }
        a.check_in().patient_id.cmp(&b.check_in().patient_id)
    });
    rows
}

pub fn summarize<'a>(
    patients: &[Patient],
    scored: &'a [ScoredCheckIn],
    today: NaiveDate,
    window_days: u32,
    trend_days: u32,
) -> DashboardSummary<'a> {
    let window = DateRange::last_days(today, window_days);
    let trend = DateRange::last_days(today, trend_days);

    let check_ins_today = scored
        .iter()
        .filter(|r| r.check_in().date == today)
        .count();

    let in_window: Vec<&ScoredCheckIn> = scored
        .iter()
        .filter(|r| window.contains(r.check_in().date))
        .collect();

    // Without a roster, every patient seen in the data is expected to check in
    let expected_patients = if patients.is_empty() {
        scored
            .iter()
            .map(|r| r.check_in().patient_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    } else {
        patients.len()
    };
    let expected = expected_patients * window.len_days() as usize;
    let submitted: HashSet<(&str, NaiveDate)> = in_window
        .iter()
        .map(|r| (r.check_in().patient_id.as_str(), r.check_in().date))
        .collect();
    let missing_rate = if expected == 0 {
        0.0
    } else {
        let rate = (1.0 - submitted.len() as f64 / expected as f64) * 100.0;
        round_one_decimal(rate.clamp(0.0, 100.0))
    };

    let flagged = in_window
        .iter()
        .filter(|r| r.status().is_flagged())
        .count();
    let avg_symptom_score = mean(in_window.iter().map(|r| r.symptom_score()));

    let mut per_day: HashMap<NaiveDate, Vec<f64>> = HashMap::new();
    for row in scored.iter().filter(|r| trend.contains(r.check_in().date)) {
        per_day
            .entry(row.check_in().date)
            .or_default()
            .push(row.risk_score());
    }

    let check_ins_per_day = trend
        .days()
        .map(|date| DailyPoint {
            date,
            value: per_day.get(&date).map_or(0, Vec::len),
        })
        .collect();
    let avg_risk_per_day = trend
        .days()
        .map(|date| DailyPoint {
            date,
            value: per_day
                .get(&date)
                .and_then(|risks| mean(risks.iter().copied())),
        })
        .collect();

    DashboardSummary {
        today,
        window,
        trend,
        check_ins_today,
        window_check_ins: in_window.len(),
        missing_rate,
        flagged,
        avg_symptom_score,
        check_ins_per_day,
        avg_risk_per_day,
        needs_follow_up: needs_follow_up(scored),
    }
}

/// Every patient with their latest check-in, optionally filtered by a
/// case-insensitive search over name and condition
pub fn roster<'a>(
    patients: &'a [Patient],
    scored: &'a [ScoredCheckIn],
    search: Option<&str>,
) -> Vec<RosterRow<'a>> {
    let latest = latest_per_patient(scored);
    let query = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    patients
        .iter()
        .filter(|p| match &query {
            Some(q) => p.name.to_lowercase().contains(q) || p.condition.to_lowercase().contains(q),
            None => true,
        })
        .map(|patient| RosterRow {
            patient,
            latest: latest.get(patient.id.as_str()).copied(),
        })
        .collect()
}

/// One patient's check-ins inside `range`, newest first
pub fn history<'a>(
    scored: &'a [ScoredCheckIn],
    patient_id: &str,
    range: &DateRange,
) -> Vec<&'a ScoredCheckIn> {
    let mut rows: Vec<&ScoredCheckIn> = scored
        .iter()
        .filter(|r| r.check_in().patient_id == patient_id && range.contains(r.check_in().date))
        .collect();
    rows.sort_by(|a, b| b.check_in().date.cmp(&a.check_in().date));
    rows
}

pub fn patient_detail<'a>(scored: &'a [ScoredCheckIn], patient_id: &str) -> PatientDetail<'a> {
    let mut rows: Vec<&ScoredCheckIn> = scored
        .iter()
        .filter(|r| r.check_in().patient_id == patient_id)
        .collect();
    rows.sort_by(|a, b| a.check_in().date.cmp(&b.check_in().date));

    let latest = latest_per_patient(scored).get(patient_id).copied();

    PatientDetail {
        patient_id: patient_id.to_string(),
        latest,
        symptom_trend: rows
            .iter()
            .map(|r| DailyPoint {
                date: r.check_in().date,
                value: r.symptom_score(),
            })
            .collect(),
        check_ins: rows.len(),
        missing_notes: rows.iter().filter(|r| !r.check_in().has_notes()).count(),
    }
}

/// Count of check-ins per status
pub fn status_counts(scored: &[ScoredCheckIn]) -> Vec<(Status, usize)> {
    Status::ALL
        .iter()
        .map(|&status| (status, scored.iter().filter(|r| r.status() == status).count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::CheckIn;
    use crate::scoring::classify;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2024-03-10")
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - chrono::Duration::days(n)
    }

    fn patient(id: &str, name: &str, condition: &str) -> Patient {
        Patient {
            id: id.to_string(),
            name: name.to_string(),
            age: 70,
            condition: condition.to_string(),
            created_at: None,
        }
    }

    fn check_in(
        patient_id: &str,
        date: NaiveDate,
        symptoms: [u8; 8],
        sleep_hours: f64,
        meds_taken: bool,
    ) -> ScoredCheckIn {
        let mut c = CheckIn::new(patient_id, date).with_symptoms(symptoms);
        c.sleep_hours = sleep_hours;
        c.meds_taken = meds_taken;
        classify(c)
    }

    fn patients() -> Vec<Patient> {
        vec![
            patient("p1", "Alice Johnson", "COPD"),
            patient("p2", "Robert Chen", "Heart Failure"),
            patient("p3", "Maria Garcia", "Diabetes"),
            patient("p4", "James Wilson", "COPD"),
        ]
    }

    fn fixture() -> Vec<ScoredCheckIn> {
        vec![
            // p1: symptom 1.8, risk 1.8 Normal
            check_in("p1", today(), [3, 4, 2, 2, 0, 1, 0, 2], 7.0, true),
            // p1: symptom 3.0, risk 3.5 Normal
            check_in("p1", days_ago(1), [5, 5, 4, 3, 1, 2, 1, 3], 6.0, true),
            // p2: symptom 4.0, risk 6.5 Needs Follow-up
            check_in("p2", today(), [6, 7, 3, 5, 2, 3, 2, 4], 4.0, false),
            // p2: symptom 3.0, risk 3.5 Normal
            check_in("p2", days_ago(1), [5, 6, 2, 4, 1, 2, 1, 3], 5.0, true),
            // p4: symptom 6.0, risk 8.5 Escalated
            check_in("p4", days_ago(1), [8, 8, 6, 7, 4, 5, 4, 6], 3.0, false),
            // outside the 7-day window, inside 30 days
            check_in("p3", days_ago(12), [4, 2, 2, 3, 1, 0, 0, 2], 6.0, true),
            // outside both windows
            check_in("p3", days_ago(45), [9; 8], 2.0, false),
        ]
    }

    #[test]
    fn test_fixture_scores() {
        let rows = fixture();
        assert_eq!(rows[0].risk_score(), 1.8);
        assert_eq!(rows[1].risk_score(), 3.5);
        assert_eq!(rows[2].risk_score(), 6.5);
        assert_eq!(rows[4].risk_score(), 8.5);
        assert_eq!(rows[4].status(), Status::Escalated);
    }

    #[test]
    fn test_summary_kpis() {
        let patients = patients();
        let scored = fixture();
        let summary = summarize(&patients, &scored, today(), 7, 30);

        assert_eq!(summary.check_ins_today, 2);
        assert_eq!(summary.window_check_ins, 5);
        // 4 patients x 7 days = 28 expected, 5 submitted
        assert_eq!(summary.missing_rate, 82.1);
        assert_eq!(summary.flagged, 2);
        // (1.8 + 3.0 + 4.0 + 3.0 + 6.0) / 5 = 3.56
        assert_eq!(summary.avg_symptom_score, Some(3.6));
    }

    #[test]
    fn test_summary_daily_series() {
        let patients = patients();
        let scored = fixture();
        let summary = summarize(&patients, &scored, today(), 7, 30);

        assert_eq!(summary.check_ins_per_day.len(), 30);
        assert_eq!(summary.avg_risk_per_day.len(), 30);
        assert_eq!(summary.check_ins_per_day[0].date, days_ago(29));
        assert_eq!(summary.check_ins_per_day[29].date, today());

        assert_eq!(summary.check_ins_per_day[29].value, 2);
        assert_eq!(summary.check_ins_per_day[28].value, 3);
        assert_eq!(summary.check_ins_per_day[17].value, 1);
        assert_eq!(summary.check_ins_per_day[0].value, 0);

        // today: (1.8 + 6.5) / 2 = 4.15 -> 4.2
        assert_eq!(summary.avg_risk_per_day[29].value, Some(4.2));
        // yesterday: (3.5 + 3.5 + 8.5) / 3 = 5.1666 -> 5.2
        assert_eq!(summary.avg_risk_per_day[28].value, Some(5.2));
        assert_eq!(summary.avg_risk_per_day[27].value, None);
    }

    #[test]
    fn test_summary_follow_up_queue() {
        let patients = patients();
        let scored = fixture();
        let summary = summarize(&patients, &scored, today(), 7, 30);

        let queue: Vec<&str> = summary
            .needs_follow_up
            .iter()
            .map(|r| r.check_in().patient_id.as_str())
            .collect();
        // p4 escalated (8.5) ahead of p2 (6.5); p1 and p3 latest are Normal
        assert_eq!(queue, vec!["p4", "p2"]);
    }

    #[test]
    fn test_missing_rate_without_roster_uses_seen_patients() {
        let scored = vec![
            check_in("p1", today(), [0; 8], 8.0, true),
            check_in("p2", today(), [0; 8], 8.0, true),
        ];
        let summary = summarize(&[], &scored, today(), 1, 30);
        assert_eq!(summary.missing_rate, 0.0);
    }

    #[test]
    fn test_missing_rate_ignores_duplicate_submissions() {
        let scored = vec![
            check_in("p1", today(), [0; 8], 8.0, true),
            check_in("p1", today(), [1; 8], 8.0, true),
        ];
        let patients = vec![patient("p1", "Alice", "COPD"), patient("p2", "Bob", "CHF")];
        let summary = summarize(&patients, &scored, today(), 1, 30);
        assert_eq!(summary.missing_rate, 50.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &[], today(), 7, 30);
        assert_eq!(summary.check_ins_today, 0);
        assert_eq!(summary.missing_rate, 0.0);
        assert_eq!(summary.flagged, 0);
        assert!(summary.avg_symptom_score.is_none());
        assert!(summary.needs_follow_up.is_empty());
        assert!(summary.check_ins_per_day.iter().all(|p| p.value == 0));
    }

    #[test]
    fn test_summary_with_oversized_window_is_capped() {
        let scored = fixture();
        let summary = summarize(&patients(), &scored, today(), 100_000_000, 30);
        assert_eq!(summary.window.len_days(), crate::dashboard::MAX_WINDOW_DAYS);
        // Every fixture check-in falls inside a century-long window
        assert_eq!(summary.window_check_ins, scored.len());
    }

    #[test]
    fn test_latest_per_patient_first_wins_tie() {
        let scored = vec![
            check_in("p1", today(), [1; 8], 8.0, true),
            check_in("p1", today(), [9; 8], 8.0, true),
            check_in("p1", days_ago(2), [5; 8], 8.0, true),
        ];
        let latest = latest_per_patient(&scored);
        assert_eq!(latest["p1"].symptom_score(), 1.0);
    }

    #[test]
    fn test_roster_search() {
        let patients = patients();
        let scored = fixture();

        let all = roster(&patients, &scored, None);
        assert_eq!(all.len(), 4);
        assert!(all[2].latest.is_some()); // p3 has old check-ins
        assert_eq!(all[3].latest.unwrap().status(), Status::Escalated);

        let copd = roster(&patients, &scored, Some("copd"));
        assert_eq!(copd.len(), 2);

        let by_name = roster(&patients, &scored, Some("  CHEN "));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].patient.id, "p2");

        let blank = roster(&patients, &scored, Some("   "));
        assert_eq!(blank.len(), 4);
    }

    #[test]
    fn test_history_filters_and_orders() {
        let scored = fixture();
        let range = DateRange::last_days(today(), 30);
        let rows = history(&scored, "p1", &range);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].check_in().date, today());
        assert_eq!(rows[1].check_in().date, days_ago(1));

        let rows = history(&scored, "p3", &range);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_patient_detail() {
        let mut scored = fixture();
        let mut noted = CheckIn::new("p1", days_ago(3)).with_symptoms([2; 8]);
        noted.sleep_hours = 8.0;
        noted.notes = Some("Feeling okay".to_string());
        scored.push(classify(noted));

        let detail = patient_detail(&scored, "p1");
        assert_eq!(detail.check_ins, 3);
        assert_eq!(detail.missing_notes, 2);
        assert_eq!(detail.latest.unwrap().check_in().date, today());
        let trend: Vec<f64> = detail.symptom_trend.iter().map(|p| p.value).collect();
        assert_eq!(trend, vec![2.0, 3.0, 1.8]);
    }

    #[test]
    fn test_status_counts() {
        let counts = status_counts(&fixture());
        assert_eq!(
            counts,
            vec![
                (Status::Normal, 4),
                (Status::NeedsFollowUp, 1),
                (Status::Escalated, 2),
            ]
        );
    }
}
