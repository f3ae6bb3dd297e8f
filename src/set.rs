//! Set: make the records sharing a name and type with the input equal to
//! the input, leaving every other record alone.
//!
//! ```text
//! ;; zone                       ;; input            ;; result
//! example.com. A   192.0.2.1    example.com. A      example.com. A   192.0.2.3
//! example.com. A   192.0.2.2        192.0.2.3       example.com. TXT "hello"
//! example.com. TXT "hello"
//! ```
//!
//! An existing record identical to an input record (same data and TTL) is
//! kept and the input copy is not created again, so untouched survivors are
//! never reported as affected.

use crate::change_list::{ChangeList, ChangeState};
use crate::matching::{is_identical, lookup_by_name_and_type};
use crate::reconcile::Operation;
use crate::record::Record;

pub(crate) struct Set<'a> {
    pub records: &'a [Record],
}

impl Operation for Set<'_> {
    const NAME: &'static str = "set";

    fn plan(&self, existing: &[Record]) -> ChangeList {
        plan(existing, self.records)
    }

    fn affected(&self, existing: &[Record], current: &[Record]) -> Vec<Record> {
        affected(existing, self.records, current)
    }
}

/// Delete superseded records, keep the rest and create what is missing.
pub fn plan(existing: &[Record], records: &[Record]) -> ChangeList {
    let mut changes = ChangeList::with_capacity(existing.len() + records.len());

    for record in existing {
        let rr = record.rr();
        let state = if lookup_by_name_and_type(&rr, records).is_none()
            || records.iter().any(|wanted| is_identical(&rr, &wanted.rr()))
        {
            ChangeState::NoChange
        } else {
            ChangeState::Delete
        };
        changes.push(record.clone(), state);
    }

    for record in records {
        let rr = record.rr();
        let kept = changes
            .iter(ChangeState::NoChange)
            .any(|survivor| is_identical(&rr, &survivor.rr()));

        if !kept {
            changes.push(record.clone(), ChangeState::Create);
        }
    }

    changes
}

/// Records written or rewritten because of the input.
pub fn affected(existing: &[Record], records: &[Record], current: &[Record]) -> Vec<Record> {
    current
        .iter()
        .filter(|record| {
            let rr = record.rr();
            !existing.iter().any(|old| is_identical(&rr, &old.rr()))
                && lookup_by_name_and_type(&rr, records).is_some()
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "LibDNS.test.set.records";

    fn a(name: &str, ip: &str, ttl: u32) -> Record {
        Record::raw(name, "A", ip, ttl)
    }

    fn aaaa(name: &str, ip: &str) -> Record {
        Record::raw(name, "AAAA", ip, 3600)
    }

    #[test]
    fn test_plan_replaces_same_name_and_type() {
        let existing = vec![
            a(NAME, "192.0.2.1", 3600),
            a(NAME, "192.0.2.2", 3600),
            Record::raw(NAME, "TXT", "hello world", 3600),
        ];
        let records = vec![a(NAME, "192.0.2.3", 3600)];

        let changes = plan(&existing, &records);

        assert_eq!(changes.deletes(), existing[..2].to_vec());
        assert_eq!(changes.creates(), records);
        assert_eq!(
            changes.apply_list(),
            vec![existing[2].clone(), records[0].clone()]
        );
    }

    #[test]
    fn test_plan_keeps_identical_records() {
        let alpha = format!("alpha.{NAME}");
        let beta = format!("beta.{NAME}");
        let existing = vec![
            aaaa(&alpha, "2001:db8::1"),
            aaaa(&alpha, "2001:db8::2"),
            aaaa(&beta, "2001:db8::3"),
            aaaa(&beta, "2001:db8::4"),
        ];
        let records = vec![
            aaaa(&alpha, "2001:db8::1"),
            aaaa(&alpha, "2001:db8::2"),
            aaaa(&alpha, "2001:db8::5"),
        ];

        let changes = plan(&existing, &records);

        assert!(changes.deletes().is_empty());
        assert_eq!(changes.creates(), vec![aaaa(&alpha, "2001:db8::5")]);
        assert_eq!(changes.count(ChangeState::NoChange), 4);
    }

    #[test]
    fn test_plan_rewrites_on_ttl_change() {
        let existing = vec![a("www", "192.0.2.1", 3600)];
        let records = vec![a("www", "192.0.2.1", 60)];

        let changes = plan(&existing, &records);

        assert_eq!(changes.deletes(), existing);
        assert_eq!(changes.creates(), records);
    }

    #[test]
    fn test_plan_without_changes() {
        let existing = vec![a("www", "192.0.2.1", 300)];
        let changes = plan(&existing, &existing);
        assert!(!changes.has_changes());

        assert!(!plan(&[], &[]).has_changes());
    }

    #[test]
    fn test_affected_excludes_survivors() {
        let existing = vec![a("www", "192.0.2.1", 300), a("mail", "192.0.2.9", 300)];
        let records = vec![a("www", "192.0.2.1", 300), a("www", "192.0.2.2", 300)];
        let current = vec![
            a("mail", "192.0.2.9", 300),
            a("www", "192.0.2.1", 300),
            a("www", "192.0.2.2", 300),
        ];

        assert_eq!(
            affected(&existing, &records, &current),
            vec![a("www", "192.0.2.2", 300)]
        );
    }
}
