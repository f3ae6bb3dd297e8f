//! Record comparison rules.
//!
//! - exact: name, type and data equal (TTL ignored)
//! - identity: name and type equal
//! - removal: case-insensitive name; type, data and TTL only when the
//!   criterion sets them
//!
//! Lookups are linear scans where the first match wins. Zones are small and
//! the store round trip dominates, so no index is built.

use crate::record::{Record, Rr};

/// Name, type and data are equal.
pub fn is_exact_match(a: &Rr, b: &Rr) -> bool {
    a.name == b.name && a.rtype == b.rtype && a.data == b.data
}

/// Name and type are equal.
pub fn is_identity_match(a: &Rr, b: &Rr) -> bool {
    a.name == b.name && a.rtype == b.rtype
}

/// Exact match with equal TTL.
pub fn is_identical(a: &Rr, b: &Rr) -> bool {
    is_exact_match(a, b) && a.ttl == b.ttl
}

/// `record` may be removed by `criterion`.
pub fn is_removal_match(record: &Rr, criterion: &Rr) -> bool {
    record.name.eq_ignore_ascii_case(&criterion.name)
        && (criterion.rtype.is_empty() || record.rtype == criterion.rtype)
        && (criterion.data.is_empty() || record.data == criterion.data)
        && (criterion.ttl == 0 || record.ttl == criterion.ttl)
}

/// First record in `records` satisfying `matches(item, candidate)`.
pub fn lookup<'a, F>(item: &Rr, records: &'a [Record], matches: F) -> Option<&'a Record>
where
    F: Fn(&Rr, &Rr) -> bool,
{
    records
        .iter()
        .find(|candidate| matches(item, candidate.rr().as_ref()))
}

/// First record sharing name and type with `item`.
pub fn lookup_by_name_and_type<'a>(item: &Rr, records: &'a [Record]) -> Option<&'a Record> {
    lookup(item, records, is_identity_match)
}

/// `item` exists verbatim in `records`.
pub fn is_in_list(item: &Rr, records: &[Record]) -> bool {
    lookup(item, records, is_exact_match).is_some()
}

/// `item` is matched by at least one of the deletion `criteria`.
pub fn is_eligible_for_removal(item: &Rr, criteria: &[Record]) -> bool {
    lookup(item, criteria, is_removal_match).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(name: &str, rtype: &str, data: &str, ttl: u32) -> Rr {
        Rr::new(name, rtype, data, ttl)
    }

    #[test]
    fn test_exact_match_ignores_ttl() {
        assert!(is_exact_match(
            &rr("www", "A", "192.0.2.1", 60),
            &rr("www", "A", "192.0.2.1", 3600)
        ));
        assert!(!is_exact_match(
            &rr("www", "A", "192.0.2.1", 60),
            &rr("WWW", "A", "192.0.2.1", 60)
        ));
        assert!(!is_identical(
            &rr("www", "A", "192.0.2.1", 60),
            &rr("www", "A", "192.0.2.1", 3600)
        ));
    }

    #[test]
    fn test_identity_match_ignores_data() {
        assert!(is_identity_match(
            &rr("www", "A", "192.0.2.1", 60),
            &rr("www", "A", "192.0.2.2", 300)
        ));
        assert!(!is_identity_match(
            &rr("www", "A", "192.0.2.1", 60),
            &rr("www", "AAAA", "192.0.2.1", 60)
        ));
    }

    #[test]
    fn test_removal_match_wildcards() {
        let record = rr("Www", "TXT", "hello", 300);

        assert!(is_removal_match(&record, &rr("www", "", "", 0)));
        assert!(is_removal_match(&record, &rr("WWW", "TXT", "", 0)));
        assert!(is_removal_match(&record, &rr("www", "TXT", "hello", 300)));
        assert!(!is_removal_match(&record, &rr("www", "A", "", 0)));
        assert!(!is_removal_match(&record, &rr("www", "", "bye", 0)));
        assert!(!is_removal_match(&record, &rr("www", "", "", 60)));
        assert!(!is_removal_match(&record, &rr("mail", "", "", 0)));
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let records = vec![
            Record::raw("www", "A", "192.0.2.1", 60),
            Record::raw("www", "A", "192.0.2.2", 60),
        ];

        let found = lookup_by_name_and_type(&rr("www", "A", "", 0), &records).unwrap();
        assert_eq!(found.rr().data, "192.0.2.1");
        assert!(lookup_by_name_and_type(&rr("www", "TXT", "", 0), &records).is_none());
    }

    #[test]
    fn test_list_helpers_see_typed_records() {
        let records = vec![Record::address("www", "192.0.2.1".parse().unwrap(), 60)];

        assert!(is_in_list(&rr("www", "A", "192.0.2.1", 0), &records));
        assert!(!is_in_list(&rr("www", "A", "192.0.2.9", 0), &records));

        let criteria = vec![Record::raw("WWW", "", "", 0)];
        assert!(is_eligible_for_removal(&rr("www", "A", "192.0.2.1", 60), &criteria));
    }
}
