use std::collections::BTreeMap;

use crate::domain::models::TraitDomain;

/// Scores are reported on a fixed 0-5 scale.
pub const SCALE_MAX: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub value: f64,
    /// Fill ratio for the proportional bar, clamped to 0..=1.
    pub ratio: f64,
}

/// Presentation rows for a scored summary. Recognized trait codes get their
/// display names; anything else keeps the raw code. An empty summary yields
/// no rows and the view renders nothing.
pub fn summary_rows(summary: &BTreeMap<String, f64>) -> Vec<SummaryRow> {
    summary
        .iter()
        .map(|(code, value)| {
            let label = match TraitDomain::from_code(code) {
                Some(domain) => domain.display_name().to_string(),
                None => code.clone(),
            };
            SummaryRow {
                label,
                value: *value,
                ratio: (value / SCALE_MAX).clamp(0.0, 1.0),
            }
        })
        .collect()
}
