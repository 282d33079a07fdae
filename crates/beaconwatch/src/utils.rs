use crate::BeaconError;
use beaconwatch_api::ChainHead;
use serde::{Deserialize, Deserializer};
use std::num::ParseIntError;

/// Beacon APIs encode integers as JSON strings
pub(crate) fn deserialize_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_uint(&s).map_err(serde::de::Error::custom)
}

/// Parse an unsigned integer, accepting `0x`, `0o` and `0b` prefixes.
/// Signs are rejected, including the `+` that `from_str_radix` allows.
pub(crate) fn parse_uint(s: &str) -> Result<u64, ParseIntError> {
    let (digits, radix) = match s.get(..2) {
        Some("0x") | Some("0X") => (&s[2..], 16),
        Some("0o") | Some("0O") => (&s[2..], 8),
        Some("0b") | Some("0B") => (&s[2..], 2),
        _ => (s, 10),
    };
    if digits.starts_with('+') {
        // "-" always fails for u64; reuse its error for "+" as well.
        return u64::from_str_radix("-", radix);
    }
    u64::from_str_radix(digits, radix)
}

pub(crate) fn parse_field(field: &'static str, value: &str) -> Result<u64, BeaconError> {
    parse_uint(value).map_err(|source| BeaconError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}

/// Sync status is best-effort: a malformed distance is logged and
/// reported as not syncing.
pub(crate) fn is_syncing_from_distance(sync_distance: &str) -> bool {
    match parse_uint(sync_distance) {
        Ok(distance) => distance > 0,
        Err(e) => {
            tracing::warn!(
                sync_distance,
                "Failed to parse sync distance, assuming not syncing: {}",
                e
            );
            false
        }
    }
}

/// Chain head fields as reported by the node, before slot parsing.
pub(crate) struct RawChainHead<'a> {
    pub head_slot: &'a str,
    pub head_block_root: &'a str,
    pub finalized_slot: &'a str,
    pub finalized_block_root: &'a str,
    pub justified_slot: &'a str,
    pub justified_block_root: &'a str,
}

impl RawChainHead<'_> {
    /// An unparsable head slot means the node has no head yet and maps to
    /// the pre-genesis head. Checkpoint slots must parse once the head does.
    pub(crate) fn parse(&self) -> Result<ChainHead, BeaconError> {
        let Ok(head_slot) = parse_uint(self.head_slot) else {
            return Ok(ChainHead::pre_genesis());
        };

        Ok(ChainHead {
            head_slot,
            head_block_root: self.head_block_root.to_string(),
            finalized_slot: parse_field("finalized_slot", self.finalized_slot)?,
            finalized_block_root: self.finalized_block_root.to_string(),
            justified_slot: parse_field("justified_slot", self.justified_slot)?,
            justified_block_root: self.justified_block_root.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw<'a>(head: &'a str, finalized: &'a str, justified: &'a str) -> RawChainHead<'a> {
        RawChainHead {
            head_slot: head,
            head_block_root: "0xaa",
            finalized_slot: finalized,
            finalized_block_root: "0xbb",
            justified_slot: justified,
            justified_block_root: "0xcc",
        }
    }

    #[test]
    fn test_parse_uint_prefixes() {
        assert_eq!(parse_uint("12").unwrap(), 12);
        assert_eq!(parse_uint("0x10").unwrap(), 16);
        assert_eq!(parse_uint("0o10").unwrap(), 8);
        assert_eq!(parse_uint("0b10").unwrap(), 2);
        assert_eq!(parse_uint("0").unwrap(), 0);
        assert!(parse_uint("").is_err());
        assert!(parse_uint("-1").is_err());
        assert!(parse_uint("0x").is_err());
        assert!(parse_uint("+5").is_err());
        assert!(parse_uint("0x+5").is_err());
        assert!(parse_uint("0b+1").is_err());
    }

    #[test]
    fn test_sync_distance() {
        assert!(!is_syncing_from_distance("0"));
        assert!(is_syncing_from_distance("12"));
        assert!(!is_syncing_from_distance("twelve"));
        assert!(!is_syncing_from_distance(""));
    }

    #[test]
    fn test_raw_chain_head_parses() {
        let head = raw("100", "64", "96").parse().unwrap();
        assert_eq!(head.head_slot, 100);
        assert_eq!(head.head_block_root, "0xaa");
        assert_eq!(head.finalized_slot, 64);
        assert_eq!(head.finalized_block_root, "0xbb");
        assert_eq!(head.justified_slot, 96);
        assert_eq!(head.justified_block_root, "0xcc");
    }

    #[test]
    fn test_unparsable_head_slot_is_pre_genesis() {
        // Checkpoints are not looked at once the head slot is missing.
        let head = raw("", "garbage", "garbage").parse().unwrap();
        assert_eq!(head, ChainHead::pre_genesis());

        for signed in ["+5", "0x+5", "-5"] {
            let head = raw(signed, "64", "96").parse().unwrap();
            assert_eq!(head, ChainHead::pre_genesis(), "head slot {signed:?}");
        }
    }

    #[test]
    fn test_unparsable_checkpoint_slot_fails() {
        let err = raw("100", "x", "96").parse().unwrap_err();
        assert!(matches!(
            err,
            BeaconError::InvalidNumber {
                field: "finalized_slot",
                ..
            }
        ));

        let err = raw("100", "+64", "96").parse().unwrap_err();
        assert!(matches!(
            err,
            BeaconError::InvalidNumber {
                field: "finalized_slot",
                ..
            }
        ));

        let err = raw("100", "64", "0x+60").parse().unwrap_err();
        assert!(matches!(
            err,
            BeaconError::InvalidNumber {
                field: "justified_slot",
                ..
            }
        ));

        let err = raw("100", "64", "").parse().unwrap_err();
        assert!(matches!(
            err,
            BeaconError::InvalidNumber {
                field: "justified_slot",
                ..
            }
        ));
    }
}
