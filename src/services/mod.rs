//! Parsing pipeline and derived views
//!
//! - **lexer / attributes**: one line of text to one [`Token`](crate::models::Token)
//! - **assembler**: tokens to records, warnings and statistics
//! - **classifier**: live / movie / series heuristics
//! - **parser / stream**: whole-document, file, URL and streaming entry points
//! - **decode / fetch**: bytes from disk or HTTP to text
//! - **normalizer / quality / dedup**: views over a parsed playlist

pub mod assembler;
pub mod attributes;
pub mod classifier;
pub mod decode;
pub mod dedup;
pub mod fetch;
pub mod lexer;
pub mod normalizer;
pub mod parser;
pub mod quality;
pub mod stream;
