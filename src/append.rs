//! Append: add records next to everything already in the zone.
//!
//! Nothing is validated here. A store that rejects duplicates fails the
//! submit, which is how a repeated append surfaces as an error.

use crate::change_list::{ChangeList, ChangeState};
use crate::matching::is_in_list;
use crate::reconcile::Operation;
use crate::record::Record;

pub(crate) struct Append<'a> {
    pub records: &'a [Record],
}

impl Operation for Append<'_> {
    const NAME: &'static str = "append";

    fn plan(&self, existing: &[Record]) -> ChangeList {
        plan(existing, self.records)
    }

    fn affected(&self, existing: &[Record], current: &[Record]) -> Vec<Record> {
        affected(existing, current)
    }
}

/// Keep every existing record and create every new one.
pub fn plan(existing: &[Record], records: &[Record]) -> ChangeList {
    let mut changes = ChangeList::with_capacity(existing.len() + records.len());

    for record in existing {
        changes.push(record.clone(), ChangeState::NoChange);
    }

    for record in records {
        changes.push(record.clone(), ChangeState::Create);
    }

    changes
}

/// Records present after the write that were not there before.
pub fn affected(existing: &[Record], current: &[Record]) -> Vec<Record> {
    current
        .iter()
        .filter(|record| !is_in_list(&record.rr(), existing))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str, ip: &str) -> Record {
        Record::raw(name, "A", ip, 300)
    }

    #[test]
    fn test_plan_keeps_existing_untouched() {
        let existing = vec![a("www", "192.0.2.1"), a("mail", "192.0.2.2")];
        let records = vec![a("www", "192.0.2.3")];

        let changes = plan(&existing, &records);

        let kept: Vec<Record> = changes.iter(ChangeState::NoChange).cloned().collect();
        assert_eq!(kept, existing);
        assert_eq!(changes.creates(), records);
        assert_eq!(changes.apply_list().len(), 3);
    }

    #[test]
    fn test_plan_does_not_deduplicate() {
        let existing = vec![a("www", "192.0.2.1")];
        let changes = plan(&existing, &existing);
        assert_eq!(changes.apply_list().len(), 2);
    }

    #[test]
    fn test_affected_reports_only_new_records() {
        let existing = vec![a("www", "192.0.2.1")];
        let current = vec![a("www", "192.0.2.1"), a("www", "192.0.2.3")];

        let out = affected(&existing, &current);
        assert_eq!(out, vec![a("www", "192.0.2.3")]);
    }
}
