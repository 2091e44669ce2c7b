//! runsheet core library: run discovery, metadata parsing and row derivation.
//!
//! - [`metadata`]: parse one run's JSON metadata into a [`RawRecord`]
//! - [`crawler`]: select run directories and yield records lazily
//! - [`section`]: derive normalized [`SectionRow`]s
//! - [`error`]: [`ParseError`], [`FormatError`], [`CrawlError`]

pub mod crawler;
pub mod error;
pub mod metadata;
pub mod section;
pub mod types;

pub use crawler::{Crawl, RunCrawler, RunDir};
pub use error::{CrawlError, FormatError, ParseError};
pub use section::{parse_emlode_tank, CellValue, SectionRow};
pub use types::{trailing_ordinal, LastMarker, RawRecord, TileRecord};
