//! Reader for the typed-dependency and one-line bracketed tree output formats
//!
//! A typed-dependency block holds one line per edge, `relation(governor-3, dependent-1)`,
//! and is terminated by a blank line or the end of the stream. Copies of a token are marked
//! with trailing apostrophes (`run-2'`), which are dropped together with the index suffix.
use std::fmt;
use std::io::BufRead;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ParseError;

lazy_static! {
  static ref DEPENDENCY_LINE: Regex =
    Regex::new(r"^([^\s(]+)\((.*)-(\d+)'*, (.*)-(\d+)'*\)$").unwrap();
}

/// One end of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenRef {
  /// The synthetic root governor (`ROOT-0`), which has no token
  Root,
  /// A 1-based index into the sentence's tokenization
  Token(usize),
}

impl TokenRef {
  /// the token index, `None` for the root
  pub fn index(self) -> Option<usize> {
    match self {
      TokenRef::Root => None,
      TokenRef::Token(index) => Some(index),
    }
  }
}

impl fmt::Display for TokenRef {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TokenRef::Root => write!(f, "ROOT"),
      TokenRef::Token(index) => write!(f, "{}", index),
    }
  }
}

/// A typed edge between two tokens, as read from the parser output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
  /// grammatical relation, e.g. `nsubj`
  pub relation: String,
  /// the head of the relation
  pub governor: TokenRef,
  /// the dependent of the relation
  pub dependent: TokenRef,
  /// surface form of the governor, with the index suffix stripped
  pub governor_word: String,
  /// surface form of the dependent, with the index suffix stripped
  pub dependent_word: String,
}

/// Why a dependency line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedLine {
  /// the line does not have the `relation(governor-N, dependent-M)` shape
  Shape(String),
  /// the dependent was given index 0, which only the root may carry
  RootDependent(String),
}

/// Parse a single `relation(governor-N, dependent-M)` line.
/// Governor index `0` becomes `TokenRef::Root`.
pub fn parse_dependency_line(line: &str) -> Result<Dependency, MalformedLine> {
  let line = line.trim();
  let captures = match DEPENDENCY_LINE.captures(line) {
    Some(captures) => captures,
    None => return Err(MalformedLine::Shape(line.to_string())),
  };
  let index = |group: usize| captures[group].parse::<usize>();
  let (governor_index, dependent_index) = match (index(3), index(5)) {
    (Ok(g), Ok(d)) => (g, d),
    _ => return Err(MalformedLine::Shape(line.to_string())),
  };
  if dependent_index == 0 {
    return Err(MalformedLine::RootDependent(line.to_string()));
  }
  let governor = if governor_index == 0 {
    TokenRef::Root
  } else {
    TokenRef::Token(governor_index)
  };
  Ok(Dependency {
    relation: captures[1].to_string(),
    governor,
    dependent: TokenRef::Token(dependent_index),
    governor_word: captures[2].to_string(),
    dependent_word: captures[4].to_string(),
  })
}

/// Parse every line of a block, failing on the first malformed one
pub fn parse_dependency_block(lines: &[String]) -> Result<Vec<Dependency>, MalformedLine> {
  lines.iter().map(|line| parse_dependency_line(line)).collect()
}

/// Splits a typed-dependency stream into per-sentence blocks of raw lines
pub struct DependencyBlocks<R: BufRead> {
  reader: R,
  exhausted: bool,
}

impl<R: BufRead> DependencyBlocks<R> {
  /// Wrap a reader positioned at the first block
  pub fn new(reader: R) -> Self {
    DependencyBlocks {
      reader,
      exhausted: false,
    }
  }

  /// Read the next block. `Ok(None)` means the stream held no more data;
  /// `Ok(Some(vec![]))` is an empty block, i.e. a sentence without dependencies.
  /// Undecodable bytes are replaced rather than rejected.
  pub fn next_block(&mut self) -> Result<Option<Vec<String>>, ParseError> {
    if self.exhausted {
      return Ok(None);
    }
    let mut lines = Vec::new();
    let mut buffer = Vec::new();
    let mut read_any = false;
    loop {
      let line = match read_line_lossy(&mut self.reader, &mut buffer)? {
        Some(line) => line,
        None => {
          self.exhausted = true;
          break;
        },
      };
      read_any = true;
      if line.is_empty() {
        break;
      }
      lines.push(line);
    }
    if read_any {
      Ok(Some(lines))
    } else {
      Ok(None)
    }
  }

  /// Consume whatever is left, counting the blocks that still hold lines
  pub fn count_remaining(&mut self) -> Result<u64, ParseError> {
    let mut remaining = 0;
    while let Some(block) = self.next_block()? {
      if !block.is_empty() {
        remaining += 1;
      }
    }
    Ok(remaining)
  }
}

/// Read one trimmed line, replacing undecodable bytes. `None` at the end of the stream.
pub(crate) fn read_line_lossy<R: BufRead>(
  reader: &mut R,
  buffer: &mut Vec<u8>,
) -> Result<Option<String>, ParseError> {
  buffer.clear();
  if reader.read_until(b'\n', buffer)? == 0 {
    return Ok(None);
  }
  Ok(Some(String::from_utf8_lossy(buffer).trim().to_string()))
}

/// Whether `line` looks like a usable one-line bracketed tree: parenthesised,
/// balanced, and holding at least one label or word
pub fn is_bracketed_tree(line: &str) -> bool {
  let line = line.trim();
  if !line.starts_with('(') || !line.ends_with(')') {
    return false;
  }
  let mut depth: i64 = 0;
  let mut has_content = false;
  for c in line.chars() {
    match c {
      '(' => depth += 1,
      ')' => {
        depth -= 1;
        if depth < 0 {
          return false;
        }
      },
      c if !c.is_whitespace() => has_content = true,
      _ => {},
    }
  }
  depth == 0 && has_content
}
