//! # Stanford parser bridge for interaction XML corpora
//! Stages sentences of a corpus for the Stanford tools, runs them as an external process,
//! and inserts the bracketed trees or typed dependencies they produce back into the corpus.
//! Precomputed typed-dependency files can be inserted the same way.

#![deny(
  missing_docs,
  trivial_casts,
  trivial_numeric_casts,
  unused_import_braces,
  unused_qualifications
)]

pub mod archive;
pub mod data;
pub mod dependency;
pub mod error;
pub mod insertion;
pub mod process;
pub mod report;
pub mod staging;
pub mod stanford;
pub mod util;

pub use crate::error::ParseError;
pub use crate::report::ParseReport;
pub use crate::staging::Action;
pub use crate::stanford::{RunOptions, StanfordParser};
