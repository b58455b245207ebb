//! Terminal rendering of entries, the distribution breakdown and analysis
//! results. Line building is kept separate from printing so it can be
//! checked without capturing stdout.

use ansi_term::Colour;

use crate::{
    tracker::{
        aggregate::CategoryTotal,
        entities::{find_category, AiAnalysis, TimeCategory, TimeEntry},
    },
    utils::format::format_minutes,
};

/// Parses a `#rrggbb` display color into a paintable terminal color.
pub fn category_colour(hex: &str) -> Option<Colour> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Colour::RGB(r, g, b))
}

fn painted_name(name: &str, color: &str) -> String {
    match category_colour(color) {
        Some(colour) => colour.paint(name).to_string(),
        None => name.to_string(),
    }
}

/// One log line per entry, newest first. Entries whose category no longer
/// exists render as "Unknown".
pub fn entry_lines(entries: &[TimeEntry], categories: &[TimeCategory]) -> Vec<String> {
    let mut sorted: Vec<&TimeEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));

    sorted
        .into_iter()
        .map(|entry| {
            let name = match find_category(categories, &entry.category_id) {
                Some(category) => painted_name(category.name, category.color),
                None => "Unknown".to_string(),
            };
            let description = if entry.description.is_empty() {
                String::new()
            } else {
                format!("\t{}", entry.description)
            };
            format!(
                "{}\t{}\t{}\t{}{}",
                entry.id,
                entry.date.format("%Y-%m-%d %H:%M"),
                name,
                format_minutes(entry.duration_minutes),
                description
            )
        })
        .collect()
}

/// The distribution breakdown, one slice per non-empty category with its
/// share of the total.
pub fn summary_lines(totals: &[CategoryTotal]) -> Vec<String> {
    let total: i64 = totals.iter().map(|t| t.minutes).sum();

    totals
        .iter()
        .map(|slice| {
            let percent = if total > 0 {
                slice.minutes * 100 / total
            } else {
                0
            };
            format!(
                "{}%\t{}\t{}",
                percent,
                format_minutes(slice.minutes),
                painted_name(&slice.name, &slice.color)
            )
        })
        .collect()
}

pub fn analysis_lines(analysis: &AiAnalysis) -> Vec<String> {
    let mut lines = vec!["Key Insights:".to_string()];
    lines.extend(analysis.insights.iter().map(|i| format!("  - {i}")));
    lines.push(String::new());
    lines.push("Suggestions:".to_string());
    lines.extend(analysis.suggestions.iter().map(|s| format!("  - {s}")));
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
