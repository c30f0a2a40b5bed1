//! 進捗サマリ

use crate::catalog::Catalog;
use crate::error::Result;
use crate::store::ResultStore;
use dwarf_classify_common::{ClassificationRecord, Existence};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub yes: usize,
    pub maybe: usize,
    pub no: usize,
    /// カタログにない天体の確定行（別セッションの結果が混ざっている可能性）
    pub unknown_ids: usize,
}

pub fn summarize(catalog: &Catalog, records: &[ClassificationRecord]) -> StatusSummary {
    let catalog_ids: HashSet<&str> = catalog.list_items().iter().map(|i| i.id.as_str()).collect();
    let mut summary = StatusSummary {
        total: catalog.len(),
        ..Default::default()
    };

    for record in records {
        if !catalog_ids.contains(record.item_id.as_str()) {
            summary.unknown_ids += 1;
            continue;
        }
        summary.completed += 1;
        match record.existence {
            Existence::Yes => summary.yes += 1,
            Existence::Maybe => summary.maybe += 1,
            Existence::No => summary.no += 1,
        }
    }

    summary.remaining = summary.total - summary.completed;
    summary
}

pub fn load_summary(catalog: &Catalog, store: &ResultStore) -> Result<StatusSummary> {
    Ok(summarize(catalog, &store.load_records()?))
}
