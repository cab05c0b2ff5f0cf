//! Tallies of what happened to each sentence during a run
use std::fmt;
use std::ops::AddAssign;

/// Counts gathered while staging and inserting parses.
/// Every phase returns its own report; the pipeline merges them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
  /// sentences whose parser output was consumed
  pub sentences: u64,
  /// sentences that received at least one dependency (or a tree in `penn` mode)
  pub inserted: u64,
  /// dependency edges attached
  pub dependencies: u64,
  /// sentences whose output was blank, malformed or missing
  pub fail: u64,
  /// sentences with an empty dependency block
  pub no_dependencies: u64,
  /// sentences skipped because they were already parsed
  pub existing: u64,
  /// sentences lacking a bracketed tree (`convert` mode)
  pub no_penn: u64,
  /// sentences lacking a tokenization (`dep` mode)
  pub no_tokens: u64,
  /// sentences lacking text (`penn` mode)
  pub no_text: u64,
  /// documents visited when inserting precomputed parses
  pub documents: u64,
  /// documents with no precomputed parse file
  pub documents_without_parse: u64,
  /// non-blank output left over after the last sentence
  pub extra_blocks: u64,
}

impl ParseReport {
  /// create an empty report
  pub fn new() -> Self { ParseReport::default() }

  /// sentences that were looked at but not staged
  pub fn skipped(&self) -> u64 { self.existing + self.no_penn + self.no_tokens + self.no_text }
}

impl AddAssign for ParseReport {
  fn add_assign(&mut self, other: ParseReport) {
    self.sentences += other.sentences;
    self.inserted += other.inserted;
    self.dependencies += other.dependencies;
    self.fail += other.fail;
    self.no_dependencies += other.no_dependencies;
    self.existing += other.existing;
    self.no_penn += other.no_penn;
    self.no_tokens += other.no_tokens;
    self.no_text += other.no_text;
    self.documents += other.documents;
    self.documents_without_parse += other.documents_without_parse;
    self.extra_blocks += other.extra_blocks;
  }
}

impl fmt::Display for ParseReport {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "{:?} sentences processed;", self.sentences)?;
    writeln!(f, "{:?} sentences inserted ({:?} dependencies);", self.inserted, self.dependencies)?;
    writeln!(f, "{:?} failed;", self.fail)?;
    writeln!(f, "{:?} without dependencies;", self.no_dependencies)?;
    writeln!(
      f,
      "{:?} skipped ({:?} existing, {:?} no tree, {:?} no tokens, {:?} no text);",
      self.skipped(),
      self.existing,
      self.no_penn,
      self.no_tokens,
      self.no_text
    )?;
    if self.documents > 0 {
      writeln!(
        f,
        "{:?} documents ({:?} without parse file);",
        self.documents, self.documents_without_parse
      )?;
    }
    if self.extra_blocks > 0 {
      writeln!(f, "{:?} unconsumed output blocks", self.extra_blocks)?;
    }
    Ok(())
  }
}
