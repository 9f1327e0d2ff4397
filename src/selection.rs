use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The set of agencies currently included in the analysis.
///
/// Starts out holding every agency of the dataset it was created from and can
/// only ever hold agencies from that set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    available: BTreeSet<String>,
    selected: BTreeSet<String>,
}

impl Selection {
    pub fn all<I, S>(agencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let available: BTreeSet<String> = agencies.into_iter().map(Into::into).collect();
        Selection {
            selected: available.clone(),
            available,
        }
    }

    /// Replaces the whole selection. Agencies outside the dataset are dropped.
    pub fn set<I, S>(&mut self, agencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected = BTreeSet::new();
        for agency in agencies {
            let agency = agency.into();
            if self.available.contains(&agency) {
                selected.insert(agency);
            } else {
                warn!(
                    action = "ignore",
                    component = "selection",
                    agency = %agency,
                    "Agency not present in dataset"
                );
            }
        }
        debug!(
            action = "set",
            component = "selection",
            selected = selected.len(),
            available = self.available.len(),
            "Selection replaced"
        );
        self.selected = selected;
    }

    pub fn reset(&mut self) {
        self.selected = self.available.clone();
    }

    pub fn contains(&self, agency: &str) -> bool {
        self.selected.contains(agency)
    }

    pub fn is_all(&self) -> bool {
        self.selected.len() == self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.available.iter().map(String::as_str)
    }
}
