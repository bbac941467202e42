//! Lazy case-insensitive search over a snapshot.

use crate::model::record::TechnologyRecord;
use std::slice::Iter;

/// Iterator of records whose title, description or category contains the
/// search term. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Search<'a> {
    records: Iter<'a, TechnologyRecord>,
    needle: Option<String>,
}

impl<'a> Search<'a> {
    /// A blank term matches every record.
    pub fn new(records: &'a [TechnologyRecord], term: &str) -> Self {
        let term = term.trim();
        Self {
            records: records.iter(),
            needle: (!term.is_empty()).then(|| term.to_lowercase()),
        }
    }
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a TechnologyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_deref();
        self.records
            .by_ref()
            .find(|record| needle.map_or(true, |needle| record.matches_lowercase(needle)))
    }
}

#[cfg(test)]
mod tests {
    use super::Search;
    use crate::model::record::{NewTechnology, TechnologyRecord};

    fn records() -> Vec<TechnologyRecord> {
        vec![
            TechnologyRecord::from_new(1, NewTechnology::new("React", "UI library", "frontend"), ""),
            TechnologyRecord::from_new(2, NewTechnology::new("Vue", "Progressive framework", "frontend"), ""),
            TechnologyRecord::from_new(3, NewTechnology::new("Axum", "Web framework", "backend"), ""),
        ]
    }

    #[test]
    fn matches_title_case_insensitively() {
        let records = records();
        let ids = Search::new(&records, "react").map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn matches_description_and_category() {
        let records = records();
        let ids = Search::new(&records, "FRAMEWORK").map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 3]);
        let ids = Search::new(&records, "backend").map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn blank_term_returns_everything_and_clones_restart() {
        let records = records();
        let search = Search::new(&records, "   ");
        assert_eq!(search.clone().count(), 3);
        assert_eq!(search.count(), 3);
    }
}
