//! Year-over-year size-tier transition detection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{TierRecords, TransitionRecord};
use crate::observability::metrics;

/// One line of the transition summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionSummaryRow {
    pub label: String,
    pub count: usize,
    /// Share of all transitions, rounded to two decimals.
    pub percentage: f64,
}

/// Walks each company's year-sorted tier history and emits a transition for
/// every adjacent pair of entries whose tiers differ.
///
/// "Adjacent" means adjacent in the filtered, sorted history: a company with
/// entries for 2021 and 2023 but nothing for 2022 yields a single 2021→2023
/// comparison, not a gap. Companies with fewer than two usable entries are
/// skipped. The histogram is keyed `"<from> -> <to>"`.
pub fn detect_transitions(
    records: &TierRecords,
) -> (Vec<TransitionRecord>, BTreeMap<String, usize>) {
    let mut transitions = Vec::new();
    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();

    for (ruc, history) in records {
        let entries: Vec<(&i32, &String)> = history
            .iter()
            .filter(|(_, tier)| !tier.trim().is_empty())
            .collect();
        if entries.len() < 2 {
            continue;
        }
        for pair in entries.windows(2) {
            let (year_from, tier_from) = pair[0];
            let (year_to, tier_to) = pair[1];
            if tier_from == tier_to {
                continue;
            }
            transitions.push(TransitionRecord {
                ruc: ruc.clone(),
                year_from: *year_from,
                tier_from: tier_from.clone(),
                year_to: *year_to,
                tier_to: tier_to.clone(),
            });
            *histogram
                .entry(format!("{} -> {}", tier_from, tier_to))
                .or_insert(0) += 1;
        }
    }

    metrics::transitions::detected(transitions.len());
    (transitions, histogram)
}

/// Builds the summary table from the histogram. With zero transitions the
/// summary is empty rather than dividing by zero.
pub fn summarize(histogram: &BTreeMap<String, usize>) -> Vec<TransitionSummaryRow> {
    let total: usize = histogram.values().sum();
    if total == 0 {
        return Vec::new();
    }
    histogram
        .iter()
        .map(|(label, &count)| TransitionSummaryRow {
            label: label.clone(),
            count,
            percentage: round2(count as f64 / total as f64 * 100.0),
        })
        .collect()
}

/// Latest known tier per company, one row per entity.
pub fn current_tier_snapshot(records: &TierRecords) -> Vec<(String, String)> {
    records
        .iter()
        .filter_map(|(ruc, history)| {
            history
                .iter()
                .next_back()
                .map(|(_, tier)| (ruc.clone(), tier.clone()))
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[(i32, &str)]) -> BTreeMap<i32, String> {
        entries.iter().map(|(y, t)| (*y, t.to_string())).collect()
    }

    #[test]
    fn calendar_gaps_are_invisible() {
        let mut records = TierRecords::new();
        records.insert(
            "991".into(),
            history(&[(2019, "MICRO"), (2020, "MICRO"), (2021, "PEQUENA"), (2023, "GRANDE")]),
        );

        let (transitions, histogram) = detect_transitions(&records);
        assert_eq!(
            transitions,
            vec![
                TransitionRecord {
                    ruc: "991".into(),
                    year_from: 2020,
                    tier_from: "MICRO".into(),
                    year_to: 2021,
                    tier_to: "PEQUENA".into(),
                },
                TransitionRecord {
                    ruc: "991".into(),
                    year_from: 2021,
                    tier_from: "PEQUENA".into(),
                    year_to: 2023,
                    tier_to: "GRANDE".into(),
                },
            ]
        );
        assert_eq!(histogram.get("MICRO -> PEQUENA"), Some(&1));
        assert_eq!(histogram.get("PEQUENA -> GRANDE"), Some(&1));
    }

    #[test]
    fn single_year_companies_produce_nothing() {
        let mut records = TierRecords::new();
        records.insert("991".into(), history(&[(2021, "MICRO")]));
        records.insert("992".into(), history(&[]));

        let (transitions, histogram) = detect_transitions(&records);
        assert!(transitions.is_empty());
        assert!(histogram.is_empty());
        assert!(summarize(&histogram).is_empty());
    }

    #[test]
    fn empty_tier_entries_are_filtered_before_pairing() {
        let mut records = TierRecords::new();
        records.insert(
            "991".into(),
            history(&[(2019, "MICRO"), (2020, ""), (2021, "MICRO")]),
        );
        let (transitions, _) = detect_transitions(&records);
        assert!(transitions.is_empty());
    }

    #[test]
    fn histogram_counts_match_emitted_transitions_and_percentages_close() {
        let mut records = TierRecords::new();
        records.insert(
            "991".into(),
            history(&[(2019, "MICRO"), (2020, "PEQUENA"), (2021, "MEDIANA")]),
        );
        records.insert("992".into(), history(&[(2019, "MICRO"), (2020, "PEQUENA")]));

        let (transitions, histogram) = detect_transitions(&records);
        let total: usize = histogram.values().sum();
        assert_eq!(total, transitions.len());

        let summary = summarize(&histogram);
        let pct_sum: f64 = summary.iter().map(|row| row.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 0.02, "percentages sum to {}", pct_sum);
        assert_eq!(
            summary[0],
            TransitionSummaryRow {
                label: "MICRO -> PEQUENA".into(),
                count: 2,
                percentage: 66.67,
            }
        );
    }

    #[test]
    fn snapshot_takes_most_recent_year() {
        let mut records = TierRecords::new();
        records.insert("991".into(), history(&[(2019, "MICRO"), (2022, "MEDIANA")]));
        records.insert("992".into(), history(&[(2020, "GRANDE")]));

        let snapshot = current_tier_snapshot(&records);
        assert_eq!(
            snapshot,
            vec![
                ("991".to_string(), "MEDIANA".to_string()),
                ("992".to_string(), "GRANDE".to_string()),
            ]
        );
    }
}
