pub mod create;
pub mod dump;
pub mod identifier;
pub mod scan;
pub mod summary;

pub use summary::LinkSummary;
