//! Delete: remove every record matched by one of the criteria.
//!
//! Criteria may be partial. Empty type or data and a zero TTL match
//! anything, so `{name: "www"}` removes every record named `www`.

use crate::change_list::{ChangeList, ChangeState};
use crate::matching::{is_eligible_for_removal, is_in_list};
use crate::reconcile::Operation;
use crate::record::Record;

pub(crate) struct Delete<'a> {
    pub criteria: &'a [Record],
}

impl Operation for Delete<'_> {
    const NAME: &'static str = "delete";

    fn plan(&self, existing: &[Record]) -> ChangeList {
        plan(existing, self.criteria)
    }

    fn affected(&self, existing: &[Record], current: &[Record]) -> Vec<Record> {
        affected(existing, self.criteria, current)
    }
}

/// Mark matched records for deletion, in store order.
pub fn plan(existing: &[Record], criteria: &[Record]) -> ChangeList {
    let mut changes = ChangeList::with_capacity(existing.len());

    for record in existing {
        let state = if is_eligible_for_removal(&record.rr(), criteria) {
            ChangeState::Delete
        } else {
            ChangeState::NoChange
        };
        changes.push(record.clone(), state);
    }

    changes
}

/// Matched records that are gone after the write.
pub fn affected(existing: &[Record], criteria: &[Record], current: &[Record]) -> Vec<Record> {
    existing
        .iter()
        .filter(|record| {
            let rr = record.rr();
            is_eligible_for_removal(&rr, criteria) && !is_in_list(&rr, current)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "LibDNS.test.rm.records";

    fn zone() -> Vec<Record> {
        let mut records = Vec::new();
        for i in 1..=10 {
            records.push(Record::raw(NAME, "AAAA", format!("2001:db8::{i}"), 3600));
            records.push(Record::raw(NAME, "A", format!("127.0.0.{i}"), 3600));
        }
        records.push(Record::raw("other", "A", "192.0.2.1", 3600));
        records
    }

    #[test]
    fn test_plan_by_name_only() {
        let existing = zone();
        let changes = plan(&existing, &[Record::raw(NAME.to_lowercase(), "", "", 0)]);

        assert_eq!(changes.deletes().len(), 20);
        assert_eq!(changes.apply_list(), vec![Record::raw("other", "A", "192.0.2.1", 3600)]);
    }

    #[test]
    fn test_plan_by_name_and_type() {
        let existing = zone();
        let changes = plan(&existing, &[Record::raw(NAME, "A", "", 0)]);

        assert_eq!(changes.deletes().len(), 10);
        assert!(changes.deletes().iter().all(|r| r.rr().rtype == "A"));
    }

    #[test]
    fn test_plan_without_match() {
        let existing = zone();
        let changes = plan(&existing, &[Record::raw("missing", "", "", 0)]);
        assert!(!changes.has_changes());
        assert_eq!(changes.len(), existing.len());
    }

    #[test]
    fn test_affected_only_reports_removed() {
        let existing = zone();
        let criteria = vec![Record::raw(NAME, "A", "", 0)];
        // store kept one of the matched records
        let mut current: Vec<Record> = plan(&existing, &criteria).apply_list();
        current.push(Record::raw(NAME, "A", "127.0.0.1", 3600));

        let removed = affected(&existing, &criteria, &current);
        assert_eq!(removed.len(), 9);
        assert!(!removed.contains(&Record::raw(NAME, "A", "127.0.0.1", 3600)));
    }
}
