pub mod metrics;
pub mod range;

pub use metrics::{
    history, latest_per_patient, needs_follow_up, patient_detail, roster, status_counts, summarize,
    DailyPoint, DashboardSummary, PatientDetail, RosterRow,
};
pub use range::{parse_window, DateRange, MAX_WINDOW_DAYS};
