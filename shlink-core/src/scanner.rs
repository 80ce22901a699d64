//! Recovery scanner for records embedded in jump lists
//!
//! Automatic destination jump lists hold shortcut records with no usable
//! index, back to back or mixed with unrelated bytes. The scanner finds them
//! by their leading signature (header size 76 followed by the link CLSID),
//! decodes each candidate, and keeps the ones whose timestamps look real.
//!
//! The walk is an explicit three-state machine:
//!
//! - `SeekLength`: find the next `4C 00 00 00` at or after the cursor, then
//!   `VerifySignature` (or `Done` when none is left).
//! - `VerifySignature`: compare the 16 following bytes with the CLSID, then
//!   `Materialize`, or back to `SeekLength` at candidate + 1 on a mismatch.
//! - `Materialize`: decode a full record at the candidate, then `SeekLength`
//!   after an accepted record, at candidate + 1 after a rejected one, or
//!   `Done` when the input ran out.
//!
//! Running out of input in any state ends the scan; it is never an error.

use crate::constants::{HEADER_SIZE_FIELD, LINK_CLSID, SIGNATURE_LEN};
use crate::decoder::try_decode_link;
use crate::types::ShellLink;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A record found at a specific offset in the stream
#[derive(Debug, Clone)]
pub struct LocatedLink {
    /// Byte offset of the record's header size field
    pub offset: usize,

    /// The decoded record
    pub link: ShellLink,

    /// Bytes consumed by the decoder
    pub size: usize,
}

/// Where the scanner is in its walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for a 4-byte little-endian 76 at or after the cursor
    SeekLength,
    /// A length field matched at `candidate`; check the CLSID after it
    VerifySignature {
        /// Offset of the matching length field
        candidate: usize,
    },
    /// Signature matched; decode a record starting at `candidate`
    Materialize {
        /// Offset of the record's first byte
        candidate: usize,
    },
    /// Input exhausted
    Done,
}

/// Scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Total bytes scanned
    pub bytes_scanned: usize,

    /// Positions holding the header size value
    pub length_matches: usize,

    /// Positions holding the full header signature
    pub signature_matches: usize,

    /// Records accepted
    pub links_found: usize,

    /// Decoded records dropped for implausible timestamps
    pub rejected: usize,

    /// Candidates that failed to decode for reasons other than running out of input
    pub decode_failures: usize,

    /// Total bytes recovered (sum of accepted record sizes)
    pub bytes_recovered: usize,
}

impl ScanStats {
    /// Calculate recovery rate as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.bytes_scanned == 0 {
            0.0
        } else {
            (self.bytes_recovered as f64 / self.bytes_scanned as f64) * 100.0
        }
    }
}

/// Cursor-based scanner over an in-memory stream
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    state: ScanState,
    results: Vec<LocatedLink>,
    stats: ScanStats,
}

impl<'a> Scanner<'a> {
    /// Start a scan at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            state: ScanState::SeekLength,
            results: Vec::new(),
            stats: ScanStats {
                bytes_scanned: data.len(),
                ..Default::default()
            },
        }
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Cursor used by the next `SeekLength` step
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Records accepted so far
    pub fn results(&self) -> &[LocatedLink] {
        &self.results
    }

    /// Perform one transition; returns false once the scan is done
    pub fn step(&mut self) -> bool {
        self.state = match self.state {
            ScanState::SeekLength => self.seek_length(),
            ScanState::VerifySignature { candidate } => self.verify_signature(candidate),
            ScanState::Materialize { candidate } => self.materialize(candidate),
            ScanState::Done => ScanState::Done,
        };
        self.state != ScanState::Done
    }

    /// Run to completion
    pub fn run(mut self) -> (Vec<LocatedLink>, ScanStats) {
        #[cfg(feature = "logging")]
        debug!("Starting jump list scan of {} bytes", self.data.len());

        while self.step() {}

        self.stats.links_found = self.results.len();

        #[cfg(feature = "logging")]
        debug!(
            "Scan complete: found {} links out of {} bytes scanned",
            self.stats.links_found, self.stats.bytes_scanned
        );

        (self.results, self.stats)
    }

    fn seek_length(&mut self) -> ScanState {
        if self.pos + 4 > self.data.len() {
            return ScanState::Done;
        }
        // Every position before the next occurrence would fail the 4-byte compare
        let needle = HEADER_SIZE_FIELD.to_le_bytes();
        match memchr::memmem::find(&self.data[self.pos..], &needle) {
            Some(rel) => {
                self.stats.length_matches += 1;
                ScanState::VerifySignature {
                    candidate: self.pos + rel,
                }
            }
            None => ScanState::Done,
        }
    }

    fn verify_signature(&mut self, candidate: usize) -> ScanState {
        if candidate + SIGNATURE_LEN > self.data.len() {
            return ScanState::Done;
        }
        if self.data[candidate + 4..candidate + SIGNATURE_LEN] == LINK_CLSID {
            self.stats.signature_matches += 1;
            ScanState::Materialize { candidate }
        } else {
            self.pos = candidate + 1;
            ScanState::SeekLength
        }
    }

    fn materialize(&mut self, candidate: usize) -> ScanState {
        #[cfg(feature = "logging")]
        debug!("Found header signature at offset {}", candidate);

        match try_decode_link(&self.data[candidate..]) {
            Ok((link, size)) if link.header().has_plausible_times() => {
                #[cfg(feature = "logging")]
                debug!("Recovered link at offset {} ({} bytes)", candidate, size);

                self.stats.bytes_recovered += size;
                self.results.push(LocatedLink {
                    offset: candidate,
                    link,
                    size,
                });
                self.pos = candidate + size;
                ScanState::SeekLength
            }
            Ok(_) => {
                #[cfg(feature = "logging")]
                debug!("Rejected link at offset {}: unset timestamps", candidate);

                self.stats.rejected += 1;
                self.pos = candidate + 1;
                ScanState::SeekLength
            }
            Err(e) if e.is_truncation() => {
                #[cfg(feature = "logging")]
                debug!("Stream ended inside candidate at offset {}: {}", candidate, e);

                ScanState::Done
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                warn!("Failed to decode link at offset {}: {}", candidate, _e);

                self.stats.decode_failures += 1;
                self.pos = candidate + 1;
                ScanState::SeekLength
            }
        }
    }
}

/// Scan a jump list (or any byte stream) for embedded records
pub fn scan_jump_list(data: &[u8]) -> Vec<LocatedLink> {
    Scanner::new(data).run().0
}

/// Scan with statistics
pub fn scan_jump_list_with_stats(data: &[u8]) -> (Vec<LocatedLink>, ScanStats) {
    Scanner::new(data).run()
}
