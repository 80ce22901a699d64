//! Presence tracking for flag-gated fields
//!
//! Every optional field of a [`ShellLink`](crate::types::ShellLink) owns one
//! `HAS_*` bit of the header. The record's setters call
//! [`LinkFlags::updated`] with the new value, so the bit flips in the same
//! operation that changes the field.

use crate::blocks::{IdList, LinkInfo};
use crate::constants::LinkFlags;

/// A value that may count as "absent" for flag purposes
pub trait Presence {
    /// Whether the value should set its governing flag
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for LinkInfo {
    fn is_present(&self) -> bool {
        true
    }
}

impl Presence for IdList {
    fn is_present(&self) -> bool {
        true
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl LinkFlags {
    /// Flags after assigning `value` to the field governed by `flag`
    pub fn updated<T: Presence + ?Sized>(self, flag: u32, value: &T) -> Self {
        self.with(flag, value.is_present())
    }
}

/// The five flag-gated strings, in stream order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringField {
    /// Description shown in the shell
    Name,
    /// Target path relative to the link file
    RelativePath,
    /// Working directory for the launched target
    WorkingDir,
    /// Command line arguments
    Arguments,
    /// Icon file location
    IconLocation,
}

impl StringField {
    /// All fields in the order they are stored
    pub const ALL: [StringField; 5] = [
        StringField::Name,
        StringField::RelativePath,
        StringField::WorkingDir,
        StringField::Arguments,
        StringField::IconLocation,
    ];

    /// The header bit governing this field
    pub const fn flag(self) -> u32 {
        match self {
            StringField::Name => LinkFlags::HAS_NAME,
            StringField::RelativePath => LinkFlags::HAS_RELATIVE_PATH,
            StringField::WorkingDir => LinkFlags::HAS_WORKING_DIR,
            StringField::Arguments => LinkFlags::HAS_ARGUMENTS,
            StringField::IconLocation => LinkFlags::HAS_ICON_LOCATION,
        }
    }

    /// Position in [`StringField::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Label used by the text dump
    pub const fn label(self) -> &'static str {
        match self {
            StringField::Name => "Name",
            StringField::RelativePath => "RelativePath",
            StringField::WorkingDir => "WorkingDirectory",
            StringField::Arguments => "Arguments",
            StringField::IconLocation => "IconLocation",
        }
    }
}
