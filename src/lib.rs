//! This crate reads `.bib` files into a map from entry IDs to field maps,
//! ready to be filled into a reference template.
//!
//! One entry in such a file can look like this:
//!
//! ```tex
//! @inproceedings{potharaju2013juggling,
//!   title={Juggling the Jigsaw: Towards Automated Problem Inference from Network Trouble Tickets},
//!   author={Potharaju, Rahul and Jain, Navendu and Nita-Rotaru, Cristina},
//!   conference={{USENIX NSDI}},
//!   year={2013}
//! }
//! ```
//!
//! We call `inproceedings` the entry type, `potharaju2013juggling` the ID and
//! `year = {2013}` a field with name `year` and data `2013`. Besides entries,
//! `@STRING{name = value}` defines string variables usable as bare values
//! (the month abbreviations `jan` … `dec` are predefined), values can be
//! concatenated with `#`, and `@PREAMBLE`/`@COMMENT` blocks as well as `%` line
//! comments are skipped. IDs and field names are case-insensitive.
//!
//! ```rust
//! use bibfill::{Parser, Style};
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let p = Parser::from_string(r#"@book{tolkien1937, author = {J. R. R. Tolkien}, month = sep}"#.to_string());
//!     let bib = p.parse()?;
//!     for entry in bib.iter() {
//!         println!("id = {}", entry.id);
//!         for name in entry.keys() {
//!             println!("\t{}\t= {}", name, entry.normalized(name, Style::Html).unwrap_or_default());
//!         }
//!     }
//!     assert_eq!(bib.get("Tolkien1937").and_then(|e| e.get("month")), Some("September"));
//!     Ok(())
//! }
//! ```
//!
//! Field data keeps its Teχ escapes; [`normalize`] rewrites the common ones
//! into HTML entities or Unicode, and [`condition`] decides which conditional
//! template blocks apply to an entry. [`highlight`] marks up a name in the
//! source before parsing. The source is parsed at once and any
//! syntax error aborts the whole parse.

pub mod condition;
mod errors;
pub mod highlight;
mod lexer;
pub mod normalize;
mod parser;
mod types;

pub use crate::errors::{ParsingError, ParsingErrorKind};
pub use crate::normalize::Style;
pub use crate::parser::Parser;
pub use crate::types::{BibEntry, Bibliography};

/// Parse `src` in a session of its own.
pub fn parse(src: &str) -> Result<Bibliography, ParsingError> {
    Parser::from_string(src.to_string()).parse()
}
