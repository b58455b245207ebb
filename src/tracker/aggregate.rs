//! Per-category rollups of the entry list. There are two consumers with
//! deliberately different zero handling: the distribution chart drops
//! categories nobody logged time against, while the analysis prompt lists
//! every known category so the model sees the full picture, zeros included.

use super::entities::{TimeCategory, TimeEntry};

/// One slice of the distribution breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    pub minutes: i64,
}

/// Sums minutes per known category, in category-set order. Entries whose
/// category id matches nothing are skipped. Categories with no entries are
/// absent from the result, not present at zero.
pub fn chart_totals(entries: &[TimeEntry], categories: &[TimeCategory]) -> Vec<CategoryTotal> {
    categories
        .iter()
        .filter_map(|category| {
            let mut minutes = 0i64;
            let mut seen = false;
            for entry in entries.iter().filter(|e| e.category_id == category.id) {
                minutes += entry.duration_minutes;
                seen = true;
            }
            seen.then(|| CategoryTotal {
                name: category.name.to_string(),
                color: category.color.to_string(),
                minutes,
            })
        })
        .collect()
}

/// Total-hours summary embedded into the analysis prompt, one line per known
/// category, minutes rounded to the nearest whole hour.
pub fn prompt_summary(entries: &[TimeEntry], categories: &[TimeCategory]) -> String {
    categories
        .iter()
        .map(|category| {
            let minutes: i64 = entries
                .iter()
                .filter(|e| e.category_id == category.id)
                .map(|e| e.duration_minutes)
                .sum();
            let hours = (minutes as f64 / 60.0).round() as i64;
            format!("- {}: {} hours", category.name, hours)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
