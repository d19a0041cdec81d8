use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk scores strictly below this are `Normal`.
pub const FOLLOW_UP_THRESHOLD: f64 = 4.0;
/// Risk scores strictly above this are `Escalated`.
pub const ESCALATION_THRESHOLD: f64 = 7.0;

/// Discretized risk tier used to prioritize clinical attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Normal,
    #[serde(rename = "Needs Follow-up", alias = "NeedsFollowUp")]
    NeedsFollowUp,
    Escalated,
}

/// Presentation tone for a status. Renderers pick the actual colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Normal, Status::NeedsFollowUp, Status::Escalated];

    /// `< 4` Normal, `4..=7` NeedsFollowUp, `> 7` Escalated
    pub fn from_risk(risk_score: f64) -> Self {
        if risk_score < FOLLOW_UP_THRESHOLD {
            Status::Normal
        } else if risk_score <= ESCALATION_THRESHOLD {
            Status::NeedsFollowUp
        } else {
            Status::Escalated
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Normal => "Normal",
            Status::NeedsFollowUp => "Needs Follow-up",
            Status::Escalated => "Escalated",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Status::Normal => Tone::Success,
            Status::NeedsFollowUp => Tone::Warning,
            Status::Escalated => Tone::Danger,
        }
    }

    /// Anything that is not `Normal`
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Status::Normal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "normal" => Ok(Status::Normal),
            "needsfollowup" | "followup" => Ok(Status::NeedsFollowUp),
            "escalated" => Ok(Status::Escalated),
            _ => bail!(
                "Unknown status '{}' (expected normal, needs-follow-up or escalated)",
                s
            ),
        }
    }
}
