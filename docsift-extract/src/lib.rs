//! Text extraction stages of the docsift pipeline.
//!
//! - [`filter`]: printable-character filter with newline collapse
//! - [`cleanup`]: removal of structural tag remnants, comments and blank lines
//! - [`html`]: single-parse HTML extractor producing text and metadata
//! - [`kind`]: classification of inputs by extension
//! - [`parser`]: external office-document conversion
//! - [`prettify`]: optional HTML formatter pre-pass
//!
//! ```
//! use docsift_extract::{extract_text_and_metadata, filter_non_readable};
//!
//! let html = b"<html><head><title>Hi</title></head><body><p>Hello</p></body></html>";
//! let result = extract_text_and_metadata(html).unwrap();
//! assert_eq!(result.metadata["title"], "Hi");
//! assert_eq!(filter_non_readable(&result.text), "HiHello\n");
//! ```
pub mod cleanup;
pub mod filter;
pub mod html;
pub mod kind;
pub mod parser;
pub mod prettify;

pub use cleanup::clean_up;
pub use filter::filter_non_readable;
pub use html::{extract_text_and_metadata, HtmlDocument};
pub use kind::FileExtensionKind;
pub use parser::{CommandParser, DocumentParser};
pub use prettify::{CommandPrettifier, Prettifier};
