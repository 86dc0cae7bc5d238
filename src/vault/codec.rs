//! Record set (de)serialization.
//!
//! The record set is stored as a small self-describing JSON document:
//!
//! ```json
//! {"format":"pwvault-records","version":1,"accounts":[
//!   {"organization":"Gmail","username":"a@b.com","password":"..."}
//! ]}
//! ```
//!
//! Buffers holding encoded records contain plaintext passwords, so
//! `encode` returns them wrapped in `Zeroizing`.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::record::{AccountRecord, RecordSet};
use crate::errors::{PwVaultError, Result};

/// Value of the `format` field in every encoded record document.
const FORMAT_TAG: &str = "pwvault-records";

/// Current record document version.
pub const CODEC_VERSION: u32 = 1;

#[derive(Serialize)]
struct RecordDocumentRef<'a> {
    format: &'a str,
    version: u32,
    accounts: &'a [AccountRecord],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDocument {
    format: String,
    version: u32,
    accounts: Vec<AccountRecord>,
}

/// Serialize a record set, preserving record order.
pub fn encode(records: &RecordSet) -> Result<Zeroizing<Vec<u8>>> {
    let doc = RecordDocumentRef {
        format: FORMAT_TAG,
        version: CODEC_VERSION,
        accounts: records.as_slice(),
    };
    serde_json::to_vec(&doc)
        .map(Zeroizing::new)
        .map_err(|e| PwVaultError::SerializationError(format!("records: {e}")))
}

/// Parse and validate an encoded record set.
///
/// Fails with `InvalidVaultFormat` if the bytes are not a record
/// document, if any record has an invalid field, or if two records
/// share an organization.
pub fn decode(bytes: &[u8]) -> Result<RecordSet> {
    let doc: RecordDocument = serde_json::from_slice(bytes)
        .map_err(|e| PwVaultError::InvalidVaultFormat(format!("records: {e}")))?;

    if doc.format != FORMAT_TAG {
        return Err(PwVaultError::InvalidVaultFormat(format!(
            "unexpected record format '{}'",
            doc.format
        )));
    }
    if doc.version != CODEC_VERSION {
        return Err(PwVaultError::InvalidVaultFormat(format!(
            "unsupported record version {}, expected {CODEC_VERSION}",
            doc.version
        )));
    }

    for record in &doc.accounts {
        record
            .validate()
            .map_err(|e| PwVaultError::InvalidVaultFormat(format!("bad record: {e}")))?;
    }

    RecordSet::from_records(doc.accounts).map_err(|e| match e {
        PwVaultError::AccountAlreadyExists(org) => {
            PwVaultError::InvalidVaultFormat(format!("duplicate organization '{org}'"))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            AccountRecord::new("Twitter", "some@gmail.com", "abcdefgh").unwrap(),
            AccountRecord::new("Gmail", "some@gmail.com", "p\"q\\r{}").unwrap(),
            AccountRecord::new("Bücherei", "jürgen", "日本語パス").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn roundtrip_preserves_order_and_content() {
        let set = sample();
        let bytes = encode(&set).unwrap();
        assert_eq!(decode(&bytes).unwrap(), set);
    }

    #[test]
    fn empty_set_roundtrips() {
        let bytes = encode(&RecordSet::new()).unwrap();
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_format_error() {
        let inputs: [&[u8]; 4] = [b"", b"\x00\x01\x02", b"[]", br#"{"accounts":[]}"#];
        for input in inputs {
            assert!(
                matches!(decode(input), Err(PwVaultError::InvalidVaultFormat(_))),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn wrong_tag_or_version_is_rejected() {
        let wrong_tag = br#"{"format":"other","version":1,"accounts":[]}"#;
        let wrong_version = br#"{"format":"pwvault-records","version":9,"accounts":[]}"#;
        assert!(decode(wrong_tag).is_err());
        assert!(decode(wrong_version).is_err());
    }

    #[test]
    fn duplicate_organization_is_a_format_error() {
        let doc = br#"{"format":"pwvault-records","version":1,"accounts":[
            {"organization":"Gmail","username":"a","password":"x"},
            {"organization":"Gmail","username":"b","password":"y"}]}"#;
        let err = decode(doc).unwrap_err();
        assert!(matches!(err, PwVaultError::InvalidVaultFormat(ref m) if m.contains("Gmail")));
    }

    #[test]
    fn whitespace_in_stored_fields_is_rejected() {
        let doc = br#"{"format":"pwvault-records","version":1,"accounts":[
            {"organization":"Bank of America","username":"a","password":"x"}]}"#;
        assert!(matches!(
            decode(doc),
            Err(PwVaultError::InvalidVaultFormat(_))
        ));
    }
}
