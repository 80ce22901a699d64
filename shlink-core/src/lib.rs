//! # Shlink Core
//!
//! Reading, writing and recovering Windows Shell Link (`.lnk`) records.
//!
//! ## Modules
//!
//! - `constants`: Format constants, link flags, attributes, show commands
//! - `types`: Core types (ShellLink, Header, FileTime)
//! - `flags`: Presence tracking that keeps header bits in sync with fields
//! - `blocks`: Size-prefixed sub-blocks (LinkInfo, ItemID list, extra data)
//! - `encoder`: Record encoding
//! - `decoder`: Record decoding
//! - `scanner`: Jump list recovery scanning
//! - `identifier`: Time-based identifier decoding
//! - `fs`: Load/save and construction from filesystem entries

#![warn(missing_docs)]

pub mod blocks;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod flags;
pub mod fs;
pub mod identifier;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use blocks::{Block, ExtraDataBlock, IdList, ItemId, LinkInfo};
pub use constants::{FileAttributes, LinkFlags, ShowCommand};
pub use error::LinkError;
pub use flags::StringField;
pub use identifier::Identifier;
pub use types::{FileTime, Header, HeaderMut, ShellLink};

/// Result type alias for Shell Link operations
pub type Result<T> = core::result::Result<T, LinkError>;
