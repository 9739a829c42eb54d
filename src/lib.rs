//! Parse SPL-style clinical labels into numbered sections with HTML, plain text,
//! content hashes and extracted findings.

pub mod config;
pub mod document;
pub mod error;
pub mod parser;

pub use config::ParserPolicy;
pub use document::{
    Category, Document, DocumentMetadata, FindingKind, Findings, HeaderAttributes, Importance,
    SectionNode,
};
pub use error::ParseFailure;
pub use parser::{parse, parse_batch, parse_bytes, parse_with};
