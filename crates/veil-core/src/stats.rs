use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::PiiCategory;

/// Replacement counts from one processing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Every keyword match replaced
    pub keywords_replaced: usize,
    /// Distinct financial values replaced
    pub financial_replaced: usize,
    /// Distinct values replaced per category; categories with no hits are absent
    pub pii_replaced: BTreeMap<PiiCategory, usize>,
}

impl ProcessingStats {
    pub fn pii_total(&self) -> usize {
        self.pii_replaced.values().sum()
    }

    pub fn total_replacements(&self) -> usize {
        self.keywords_replaced + self.financial_replaced + self.pii_total()
    }
}
