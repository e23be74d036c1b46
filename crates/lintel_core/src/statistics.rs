//! Per (file, code) counters for reported violations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::Violation;

/// The aggregate for one code in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistic {
    pub code: String,
    pub filename: String,
    /// The text of the first violation seen.
    pub message: String,
    pub count: usize,
}

/// Aggregates reported violations.
///
/// Entries are keyed by `(code, filename)`, so every lookup comes back
/// sorted by code, then filename.
#[derive(Debug, Default)]
pub struct Statistics {
    store: BTreeMap<(String, String), Statistic>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a reported violation. The first sighting counts as one.
    pub fn record(&mut self, violation: &Violation) {
        self.store
            .entry((violation.code.clone(), violation.filename.clone()))
            .and_modify(|statistic| statistic.count += 1)
            .or_insert_with(|| Statistic {
                code: violation.code.clone(),
                filename: violation.filename.clone(),
                message: violation.text.clone(),
                count: 1,
            });
    }

    /// Returns every distinct code recorded, sorted.
    pub fn error_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.store.keys().map(|(code, _)| code.as_str()).collect();
        codes.dedup();
        codes
    }

    /// Returns the statistics for codes starting with `prefix`, optionally
    /// limited to one file.
    pub fn statistics_for<'a>(
        &'a self,
        prefix: &'a str,
        filename: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Statistic> {
        self.store
            .iter()
            .filter(move |((code, file), _)| {
                code.starts_with(prefix) && filename.is_none_or(|wanted| wanted == file.as_str())
            })
            .map(|(_, statistic)| statistic)
    }

    /// Total number of recorded violations.
    pub fn total(&self) -> usize {
        self.store.values().map(|statistic| statistic.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(stats: &mut Statistics, code: &str, filename: &str, text: &str) {
        stats.record(&Violation::new(code, filename, 1, 1, text));
    }

    #[test]
    fn test_first_sight_counts_one_and_keeps_first_message() {
        let mut stats = Statistics::new();
        record(&mut stats, "E501", "a.py", "line too long (80 > 79)");
        record(&mut stats, "E501", "a.py", "line too long (99 > 79)");

        let all: Vec<_> = stats.statistics_for("E501", None).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].count, 2);
        assert_eq!(all[0].message, "line too long (80 > 79)");
        assert_eq!(stats.total(), 2);
    }

    #[test]
    fn test_prefix_and_filename_filter_sorted_by_code() {
        let mut stats = Statistics::new();
        record(&mut stats, "W291", "b.py", "trailing whitespace");
        record(&mut stats, "E501", "b.py", "line too long");
        record(&mut stats, "E231", "a.py", "missing whitespace");
        record(&mut stats, "E231", "b.py", "missing whitespace");

        let codes: Vec<_> = stats
            .statistics_for("E", None)
            .map(|s| (s.code.as_str(), s.filename.as_str()))
            .collect();
        assert_eq!(codes, vec![("E231", "a.py"), ("E231", "b.py"), ("E501", "b.py")]);

        let in_b: Vec<_> = stats
            .statistics_for("", Some("b.py"))
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(in_b, vec!["E231", "E501", "W291"]);

        assert_eq!(stats.error_codes(), vec!["E231", "E501", "W291"]);
    }
}
