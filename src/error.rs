//! Error types for staging, running and inserting parses.
//! Per-sentence problems are never errors; they are tallied in a `ParseReport`.
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use libxml::parser::XmlParseError;
use thiserror::Error;

/// Everything that can terminate a parsing run
#[derive(Error, Debug)]
pub enum ParseError {
  /// Filesystem failure (unwritable work directory, missing archive, ...)
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  /// The corpus could not be read, or its tree could not be modified
  #[error("XML error: {0}")]
  Xml(String),

  /// The external parser did not finish in time and was killed
  #[error("parser process timed out after {timeout:?}")]
  Timeout {
    /// the configured limit
    timeout: Duration,
    /// captured standard error of the killed process
    stderr_path: PathBuf,
  },

  /// The external parser exited unsuccessfully
  #[error("parser process exited with {code:?}: {stderr}")]
  NonZeroExit {
    /// exit code, `None` when terminated by a signal
    code: Option<i32>,
    /// captured standard error of the process
    stderr_path: PathBuf,
    /// filtered stderr content
    stderr: String,
  },

  /// The external parser succeeded but wrote nothing for a non-empty input
  #[error("parser process produced no output in {0:?}")]
  EmptyOutput(PathBuf),

  /// A required file or directory does not exist
  #[error("no such file or directory: {0:?}")]
  MissingPath(PathBuf),

  /// The run timestamp could not be formatted
  #[error("time formatting error: {0}")]
  Time(String),
}

impl From<XmlParseError> for ParseError {
  fn from(e: XmlParseError) -> Self { ParseError::Xml(format!("{:?}", e)) }
}

impl ParseError {
  /// Wrap the assorted error shapes `libxml` tree operations return
  pub(crate) fn xml<E: std::fmt::Display>(e: E) -> Self { ParseError::Xml(e.to_string()) }
}
