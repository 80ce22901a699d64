//! Time-based identifier decoding
//!
//! Link tracking stores version-1 style identifiers whose fields embed the
//! creation time (100ns intervals since 1582-10-15), a clock sequence, and
//! the hardware address of the creating machine.

use crate::error::LinkError;
use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use uuid::Uuid;

/// Seconds between 1582-10-15 and 1970-01-01
pub const GREGORIAN_UNIX_OFFSET_SECS: u64 = 12_219_292_800;

const TICKS_PER_SEC: u64 = 10_000_000;

/// Decoded identifier fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identifier {
    timestamp: Option<DateTime<Utc>>,
    mac_address: String,
    clock_id: u32,
}

impl Identifier {
    /// Decode an identifier, degrading to the default value on malformed input
    ///
    /// Accepts 32 hex digits with any number of hyphens. Never fails: a wrong
    /// length, a non-hex digit or a timestamp before 1970 yields an identifier
    /// with no timestamp, an empty address and clock id 0.
    pub fn parse(input: &str) -> Self {
        match Self::try_parse(input) {
            Ok(id) => id,
            Err(_e) => {
                #[cfg(feature = "logging")]
                tracing::debug!("Identifier decode degraded to default: {}", _e);
                Self::default()
            }
        }
    }

    /// Decode an identifier, reporting why malformed input was rejected
    pub fn try_parse(input: &str) -> Result<Self> {
        let digits: String = input.chars().filter(|&c| c != '-').collect();
        if digits.len() != 32 {
            return Err(LinkError::MalformedIdentifier(format!(
                "expected 32 hex digits, got {}",
                digits.len()
            )));
        }
        let uuid = Uuid::try_parse(&digits)
            .map_err(|e| LinkError::MalformedIdentifier(e.to_string()))?;
        let b = uuid.as_bytes();

        let low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
        let mid = u16::from_be_bytes([b[4], b[5]]) as u64;
        // drop the version nibble
        let high = (u16::from_be_bytes([b[6], b[7]]) & 0x0FFF) as u64;
        let ticks = (high << 48) | (mid << 32) | low;

        let secs = (ticks / TICKS_PER_SEC)
            .checked_sub(GREGORIAN_UNIX_OFFSET_SECS)
            .ok_or_else(|| {
                LinkError::MalformedIdentifier("timestamp precedes 1970-01-01".to_string())
            })?;
        let timestamp = i64::try_from(secs)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| {
                LinkError::MalformedIdentifier(format!("timestamp {} out of range", secs))
            })?;

        let clock_id = b[8] as u32 * 256 + b[9] as u32;
        let mac_address = format_mac(&digits[20..32]);

        Ok(Self {
            timestamp: Some(timestamp),
            mac_address,
            clock_id,
        })
    }

    /// Creation time, whole seconds
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Hardware address as six colon separated pairs, empty when absent
    pub fn mac_address(&self) -> &str {
        &self.mac_address
    }

    /// Clock sequence
    pub fn clock_id(&self) -> u32 {
        self.clock_id
    }
}

fn format_mac(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(ts) => writeln!(f, "Timestamp: {}", ts.format("%Y-%m-%d %H:%M:%S"))?,
            None => writeln!(f, "Timestamp: -")?,
        }
        writeln!(f, "ClockId: {}", self.clock_id)?;
        write!(f, "MacAddress: {}", self.mac_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SAMPLE: &str = "6c1fa1ce-1b1f-11e9-9f2a-000c29d6e5a1";

    #[test]
    fn test_decode_fields() {
        let id = Identifier::parse(SAMPLE);
        assert_eq!(id.mac_address(), "00:0c:29:d6:e5:a1");
        assert_eq!(id.clock_id(), 0x9f * 256 + 0x2a);

        let ts = id.timestamp().unwrap();
        assert_eq!(ts.year(), 2019);
        assert_eq!(ts.month(), 1);
    }

    #[test]
    fn test_timestamp_value() {
        // 0x1e91b1f6c1fa1ce ticks since 1582-10-15
        let ticks: u64 = 0x01e9_1b1f_6c1f_a1ce;
        let expected = (ticks / 10_000_000 - GREGORIAN_UNIX_OFFSET_SECS) as i64;
        let id = Identifier::parse(SAMPLE);
        assert_eq!(id.timestamp().unwrap().timestamp(), expected);
        assert_eq!(id.timestamp().unwrap().nanosecond(), 0);
    }

    #[test]
    fn test_hyphens_optional() {
        let plain = Identifier::parse(&SAMPLE.replace('-', ""));
        assert_eq!(plain, Identifier::parse(SAMPLE));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(Identifier::parse(SAMPLE), Identifier::parse(SAMPLE));
    }

    #[test]
    fn test_non_hex_degrades() {
        let id = Identifier::parse("6c1fa1ce-1b1f-11e9-9f2a-000c29d6e5zz");
        assert_eq!(id.mac_address(), "");
        assert_eq!(id.clock_id(), 0);
        assert!(id.timestamp().is_none());
    }

    #[test]
    fn test_wrong_length_degrades() {
        let id = Identifier::parse("6c1fa1ce");
        assert_eq!(id, Identifier::default());
        assert!(matches!(
            Identifier::try_parse("6c1fa1ce"),
            Err(LinkError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn test_pre_unix_timestamp_degrades() {
        // all-zero tick count lies in 1582
        let id = Identifier::parse("00000000-0000-1000-8000-000000000000");
        assert_eq!(id.mac_address(), "");
        assert!(Identifier::try_parse("00000000-0000-1000-8000-000000000000").is_err());
    }

    #[test]
    fn test_display() {
        let text = Identifier::parse(SAMPLE).to_string();
        assert!(text.contains("MacAddress: 00:0c:29:d6:e5:a1"));
        assert!(text.starts_with("Timestamp: 2019-01-"));
    }
}
