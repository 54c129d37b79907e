//! Conversion of decoded photon rows into validated records

pub mod record_parser;

// Re-export the parsing functions
pub use record_parser::{parse_record, parse_records};
