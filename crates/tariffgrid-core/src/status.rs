//! Plan status labels for subjects and objects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::SubjectType;

/// Shown when no statuses are known
pub const NO_DATA: &str = "Нет данных";

/// Progress of one planning stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Completed,
    InProgress,
    Outdated,
    NotStarted,
    #[serde(other)]
    Unknown,
}

/// Statuses keyed `P1_Status`, `P1_Gen_Status`, ...
pub type StatusMap = HashMap<String, PlanStatus>;

/// Colour class of a badge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tone {
    /// green
    Success,
    /// orange
    Warning,
    /// red
    Danger,
    /// black
    Neutral,
    Unstyled,
}

/// One plan abbreviation with its colour
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

/// How a subject's badges are coloured
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeMode {
    /// Each plan by its own status
    Regular,
    /// Green only when consumption and generation are both complete
    Combined,
    /// Generation status only
    Renewable,
}

impl BadgeMode {
    pub fn for_subject(kind: &SubjectType) -> Self {
        match kind {
            SubjectType::Vie => Self::Renewable,
            SubjectType::Consumer | SubjectType::Rek => Self::Regular,
            SubjectType::Other(_) => Self::Combined,
        }
    }
}

const PLANS: [(&str, &str); 4] = [("P1", "П1"), ("P2", "П2"), ("P3", "П3"), ("F1", "Ф")];

const OBJECT_PLANS: [(&str, &str); 10] = [
    ("P1_Status", "П1"),
    ("P1_Gen_Status", "ГП1"),
    ("P2_Status", "П2"),
    ("P2_Gen_Status", "ГП2"),
    ("P3_Status", "П3"),
    ("P3_Gen_Status", "ГП3"),
    ("F1_Status", "Ф1"),
    ("F1_Gen_Status", "ГФ1"),
    ("F2_Status", "Ф2"),
    ("F2_Gen_Status", "ГФ2"),
];

fn regular_tone(status: Option<PlanStatus>) -> Tone {
    match status {
        Some(PlanStatus::Completed) => Tone::Success,
        Some(PlanStatus::InProgress) => Tone::Warning,
        Some(PlanStatus::Outdated) => Tone::Danger,
        Some(PlanStatus::NotStarted) => Tone::Neutral,
        _ => Tone::Unstyled,
    }
}

/// Tone when green is reserved for a stricter completion condition
fn gated_tone(status: Option<PlanStatus>, complete: bool) -> Tone {
    if complete {
        return Tone::Success;
    }
    match status {
        Some(PlanStatus::Completed | PlanStatus::NotStarted) => Tone::Neutral,
        Some(PlanStatus::InProgress) => Tone::Warning,
        Some(PlanStatus::Outdated) => Tone::Danger,
        _ => Tone::Unstyled,
    }
}

/// Badges for П1, П2, П3, Ф; `None` means "no data"
pub fn badges(statuses: Option<&StatusMap>, mode: BadgeMode) -> Option<Vec<Badge>> {
    let statuses = statuses.filter(|s| !s.is_empty())?;
    let get = |key: String| statuses.get(&key).copied();

    let badges = PLANS
        .iter()
        .map(|(plan, label)| {
            let main = get(format!("{plan}_Status"));
            let gen = get(format!("{plan}_Gen_Status"));
            let tone = match mode {
                BadgeMode::Regular => regular_tone(main),
                BadgeMode::Combined => gated_tone(
                    main,
                    main == Some(PlanStatus::Completed) && gen == Some(PlanStatus::Completed),
                ),
                BadgeMode::Renewable => gated_tone(gen, gen == Some(PlanStatus::Completed)),
            };
            Badge {
                label: *label,
                tone,
            }
        })
        .collect();
    Some(badges)
}

/// Compact object status: `-П1--ГП1-` for each completed plan
pub fn completed_summary(statuses: Option<&StatusMap>) -> String {
    let Some(statuses) = statuses else {
        return NO_DATA.to_string();
    };
    let summary: String = OBJECT_PLANS
        .iter()
        .filter(|(key, _)| statuses.get(*key) == Some(&PlanStatus::Completed))
        .map(|(_, label)| format!("-{label}-"))
        .collect();
    if summary.is_empty() {
        NO_DATA.to_string()
    } else {
        summary
    }
}
