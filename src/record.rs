//! Record model.
//!
//! Stores hand back records in a generic `(name, type, data, ttl)` form
//! ([`Rr`]). Before any diffing happens those are run through a
//! [`RecordParser`] so that callers get [`TypedRecord`]s wherever a typed
//! representation exists. Matching always works on the [`Rr`] view, so raw
//! and typed records compare the same way.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Error raised when a record of a known type carries a malformed payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {rtype} record {name:?} data {data:?}: {reason}")]
pub struct RecordError {
    /// Owner name of the offending record.
    pub name: String,
    /// Record type as given by the store.
    pub rtype: String,
    /// Raw payload that failed to parse.
    pub data: String,
    /// What was wrong with it.
    pub reason: String,
}

impl RecordError {
    fn new(rr: &Rr, reason: impl Into<String>) -> Self {
        Self {
            name: rr.name.clone(),
            rtype: rr.rtype.clone(),
            data: rr.data.clone(),
            reason: reason.into(),
        }
    }
}

/// Generic resource record as exchanged with a store.
///
/// Empty `rtype`/`data` and a zero `ttl` act as wildcards when the record is
/// used as a deletion criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rr {
    /// Owner name, relative to the zone.
    pub name: String,

    /// Record type mnemonic (e.g. "A", "TXT").
    #[serde(rename = "type", default)]
    pub rtype: String,

    /// Presentation-format payload.
    #[serde(default)]
    pub data: String,

    /// TTL in seconds.
    #[serde(default)]
    pub ttl: u32,
}

impl Rr {
    /// Build a record from its four parts.
    pub fn new(
        name: impl Into<String>,
        rtype: impl Into<String>,
        data: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            rtype: rtype.into(),
            data: data.into(),
            ttl,
        }
    }
}

impl fmt::Display for Rr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.name, self.ttl, self.rtype, self.data)
    }
}

/// Type-specific payload of a [`TypedRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// A or AAAA, depending on the address family.
    Address(IpAddr),
    /// TXT record text, unquoted.
    Txt(String),
    /// CNAME target.
    Cname(String),
    /// NS target.
    Ns(String),
    /// MX record.
    Mx {
        /// Preference, lower wins.
        preference: u16,
        /// Mail exchanger host.
        target: String,
    },
    /// SRV record.
    Srv {
        /// Priority, lower wins.
        priority: u16,
        /// Relative weight within a priority.
        weight: u16,
        /// Service port.
        port: u16,
        /// Target host.
        target: String,
    },
    /// CAA record.
    Caa {
        /// Flags octet.
        flags: u8,
        /// Property tag (e.g. "issue").
        tag: String,
        /// Property value, unquoted.
        value: String,
    },
}

impl RecordData {
    /// DNS record type of this payload.
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::Address(IpAddr::V4(_)) => RecordType::A,
            RecordData::Address(IpAddr::V6(_)) => RecordType::AAAA,
            RecordData::Txt(_) => RecordType::TXT,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Ns(_) => RecordType::NS,
            RecordData::Mx { .. } => RecordType::MX,
            RecordData::Srv { .. } => RecordType::SRV,
            RecordData::Caa { .. } => RecordType::CAA,
        }
    }

    /// Presentation-format payload, as it appears in [`Rr::data`].
    pub fn to_text(&self) -> String {
        match self {
            RecordData::Address(ip) => ip.to_string(),
            RecordData::Txt(text) => text.clone(),
            RecordData::Cname(target) | RecordData::Ns(target) => target.clone(),
            RecordData::Mx { preference, target } => format!("{preference} {target}"),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {target}"),
            RecordData::Caa { flags, tag, value } => format!("{flags} {tag} {value:?}"),
        }
    }
}

/// A record whose payload has been parsed into its type-specific form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedRecord {
    /// Owner name, relative to the zone.
    pub name: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Parsed payload.
    pub data: RecordData,
}

impl TypedRecord {
    /// Generic view of this record.
    pub fn to_rr(&self) -> Rr {
        Rr {
            name: self.name.clone(),
            rtype: self.data.record_type().to_string(),
            data: self.data.to_text(),
            ttl: self.ttl,
        }
    }
}

/// A record as handled by the reconciler: either still generic or typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Generic record, not (yet) parsed.
    Raw(Rr),
    /// Record with a parsed payload.
    Typed(TypedRecord),
}

impl Record {
    /// Generic raw record.
    pub fn raw(
        name: impl Into<String>,
        rtype: impl Into<String>,
        data: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Record::Raw(Rr::new(name, rtype, data, ttl))
    }

    /// Typed record built from a name, payload and TTL.
    pub fn typed(name: impl Into<String>, data: RecordData, ttl: u32) -> Self {
        Record::Typed(TypedRecord {
            name: name.into(),
            ttl,
            data,
        })
    }

    /// A or AAAA record.
    pub fn address(name: impl Into<String>, ip: IpAddr, ttl: u32) -> Self {
        Self::typed(name, RecordData::Address(ip), ttl)
    }

    /// TXT record.
    pub fn txt(name: impl Into<String>, text: impl Into<String>, ttl: u32) -> Self {
        Self::typed(name, RecordData::Txt(text.into()), ttl)
    }

    /// Generic view used for matching and for submission.
    pub fn rr(&self) -> Cow<'_, Rr> {
        match self {
            Record::Raw(rr) => Cow::Borrowed(rr),
            Record::Typed(typed) => Cow::Owned(typed.to_rr()),
        }
    }

    /// Owner name.
    pub fn name(&self) -> &str {
        match self {
            Record::Raw(rr) => &rr.name,
            Record::Typed(typed) => &typed.name,
        }
    }

    /// True once the record carries a typed payload.
    pub fn is_typed(&self) -> bool {
        matches!(self, Record::Typed(_))
    }
}

impl From<Rr> for Record {
    fn from(rr: Rr) -> Self {
        Record::Raw(rr)
    }
}

impl From<TypedRecord> for Record {
    fn from(typed: TypedRecord) -> Self {
        Record::Typed(typed)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rr().fmt(f)
    }
}

/// Converts generic records into typed ones.
pub trait RecordParser: Send + Sync {
    /// Parse `rr` into its typed form.
    ///
    /// `Ok(None)` leaves the record generic (unknown type); an error aborts
    /// the fetch that produced it.
    fn parse(&self, rr: &Rr) -> Result<Option<TypedRecord>, RecordError>;
}

/// Parser for the common record types.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardParser;

impl RecordParser for StandardParser {
    fn parse(&self, rr: &Rr) -> Result<Option<TypedRecord>, RecordError> {
        let Ok(rtype) = rr.rtype.to_ascii_uppercase().parse::<RecordType>() else {
            return Ok(None);
        };

        let data = match rtype {
            RecordType::A | RecordType::AAAA => {
                let ip: IpAddr = rr
                    .data
                    .trim()
                    .parse()
                    .map_err(|_| RecordError::new(rr, "not an IP address"))?;
                match (rtype, ip) {
                    (RecordType::A, IpAddr::V4(_)) | (RecordType::AAAA, IpAddr::V6(_)) => {}
                    _ => return Err(RecordError::new(rr, "address family mismatch")),
                }
                RecordData::Address(ip)
            }
            RecordType::TXT => RecordData::Txt(rr.data.clone()),
            RecordType::CNAME => RecordData::Cname(rr.data.trim().to_string()),
            RecordType::NS => RecordData::Ns(rr.data.trim().to_string()),
            RecordType::MX => {
                let [preference, target] = fields::<2>(rr)?;
                RecordData::Mx {
                    preference: number(rr, preference)?,
                    target: target.to_string(),
                }
            }
            RecordType::SRV => {
                let [priority, weight, port, target] = fields::<4>(rr)?;
                RecordData::Srv {
                    priority: number(rr, priority)?,
                    weight: number(rr, weight)?,
                    port: number(rr, port)?,
                    target: target.to_string(),
                }
            }
            RecordType::CAA => {
                let mut parts = rr.data.trim().splitn(3, char::is_whitespace);
                let (Some(flags), Some(tag), Some(value)) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(RecordError::new(rr, "expected flags, tag and value"));
                };
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                RecordData::Caa {
                    flags: number(rr, flags)?,
                    tag: tag.to_string(),
                    value: value.to_string(),
                }
            }
            _ => return Ok(None),
        };

        Ok(Some(TypedRecord {
            name: rr.name.clone(),
            ttl: rr.ttl,
            data,
        }))
    }
}

/// Split the payload into exactly `N` whitespace separated fields.
fn fields<const N: usize>(rr: &Rr) -> Result<[&str; N], RecordError> {
    let parts: Vec<&str> = rr.data.split_whitespace().collect();
    parts
        .try_into()
        .map_err(|_| RecordError::new(rr, format!("expected {N} fields")))
}

fn number<T: std::str::FromStr>(rr: &Rr, field: &str) -> Result<T, RecordError> {
    field
        .parse()
        .map_err(|_| RecordError::new(rr, format!("invalid number {field:?}")))
}

/// Convert every raw record through `parser`, keeping typed records as is.
pub fn normalize(records: Vec<Record>, parser: &dyn RecordParser) -> Result<Vec<Record>, RecordError> {
    records
        .into_iter()
        .map(|record| match record {
            Record::Raw(rr) => Ok(parser.parse(&rr)?.map_or(Record::Raw(rr), Record::Typed)),
            typed => Ok(typed),
        })
        .collect()
}

/// Like [`normalize`], for deletion criteria.
///
/// Only criteria with both type and data set are parsed. An empty field is a
/// wildcard and has no typed form.
pub fn normalize_criteria(
    criteria: Vec<Record>,
    parser: &dyn RecordParser,
) -> Result<Vec<Record>, RecordError> {
    criteria
        .into_iter()
        .map(|record| match record {
            Record::Raw(rr) if !rr.rtype.is_empty() && !rr.data.is_empty() => {
                Ok(parser.parse(&rr)?.map_or(Record::Raw(rr), Record::Typed))
            }
            other => Ok(other),
        })
        .collect()
}
