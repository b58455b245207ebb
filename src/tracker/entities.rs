use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::Serialize;

/// A member of the fixed category set entries are logged against. Not
/// user-editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCategory {
    pub id: &'static str,
    pub name: &'static str,
    /// Display color as a `#rrggbb` hex string.
    pub color: &'static str,
}

pub const DEFAULT_CATEGORIES: &[TimeCategory] = &[
    TimeCategory { id: "work", name: "Work", color: "#3b82f6" },
    TimeCategory { id: "meetings", name: "Meetings", color: "#8b5cf6" },
    TimeCategory { id: "personal", name: "Personal", color: "#10b981" },
    TimeCategory { id: "family", name: "Family", color: "#f97316" },
    TimeCategory { id: "exercise", name: "Exercise", color: "#ef4444" },
    TimeCategory { id: "sleep", name: "Sleep", color: "#6366f1" },
    TimeCategory { id: "learning", name: "Learning", color: "#f59e0b" },
];

/// One logged activity. Immutable after creation; removal is the only
/// mutation the log supports.
///
/// Serialized field names match the on-disk contract of the store key, so
/// data written by earlier builds keeps loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i64,
    /// May dangle. A reference to no known category is kept and rendered as
    /// "Unknown", never rejected.
    pub category_id: String,
    /// Taken as given. Zero or negative values are the caller's problem.
    pub duration_minutes: i64,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Seed shown on first start or when the stored entry list is unreadable.
pub fn seed_entries(now: DateTime<Utc>) -> Vec<TimeEntry> {
    vec![TimeEntry {
        id: 4,
        category_id: "exercise".into(),
        duration_minutes: 45,
        description: "Morning run".into(),
        date: now,
    }]
}

/// Result of one analysis request. Never persisted; each request replaces
/// the previous response wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn find_category(categories: &[TimeCategory], id: &str) -> Option<TimeCategory> {
    categories.iter().find(|c| c.id == id).cloned()
}
