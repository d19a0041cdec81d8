pub mod engine;
pub mod status;
pub mod validation;

pub use engine::{
    classify, compute_risk_score, compute_status, compute_symptom_score, explain, score_all,
    FactorContribution, ScoreBreakdown, ScoredCheckIn,
};
pub use status::{Status, Tone};
pub use validation::{validate_check_in, ValidationError, ValidationErrors};
