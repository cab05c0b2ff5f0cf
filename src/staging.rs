//! Staging of parser input: one line per eligible sentence, in corpus order
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};

use crate::data::{Corpus, Sentence};
use crate::error::ParseError;
use crate::report::ParseReport;

/// File name of the staged input inside the work directory
pub static INPUT_FILE_NAME: &str = "input";

/// What the external parser is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// convert existing bracketed trees into typed dependencies
  Convert,
  /// parse pre-tokenized sentences into typed dependencies
  Dep,
  /// parse raw sentence text into bracketed trees
  Penn,
}

impl Action {
  /// the lowercase name used on the command line and in `depParseType`
  pub fn name(self) -> &'static str {
    match self {
      Action::Convert => "convert",
      Action::Dep => "dep",
      Action::Penn => "penn",
    }
  }

  /// whether the parser output is typed dependencies (rather than trees)
  pub fn produces_dependencies(self) -> bool { self != Action::Penn }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Action {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "convert" => Ok(Action::Convert),
      "dep" => Ok(Action::Dep),
      "penn" => Ok(Action::Penn),
      other => Err(format!("unknown action {:?}, expected convert, dep or penn", other)),
    }
  }
}

/// Outcome of the eligibility check for one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
  /// stage this line for the parser
  Eligible(String),
  /// dependencies already exist under the parser name and reparsing is off
  Existing,
  /// `convert` mode without a bracketed tree
  NoTree,
  /// `dep` mode without a tokenization
  NoTokens,
  /// `penn` mode without sentence text
  NoText,
}

impl Eligibility {
  /// record a skip in `report`; eligible sentences are not counted here
  pub fn count(&self, report: &mut ParseReport) {
    match self {
      Eligibility::Eligible(_) => {},
      Eligibility::Existing => report.existing += 1,
      Eligibility::NoTree => report.no_penn += 1,
      Eligibility::NoTokens => report.no_tokens += 1,
      Eligibility::NoText => report.no_text += 1,
    }
  }
}

fn single_line(text: &str) -> String { text.replace('\n', " ").replace('\r', " ").trim().to_string() }

/// Decide whether `sentence` is sent to the parser, and with which input line.
/// Does not modify the sentence; reparse removal happens in `make_input_file`.
pub fn eligibility(sentence: &Sentence, parser: &str, action: Action, reparse: bool) -> Eligibility {
  if action.produces_dependencies() && !reparse && sentence.has_dependencies(parser) {
    return Eligibility::Existing;
  }
  match action {
    Action::Convert => match sentence.penn_tree(parser) {
      Some(tree) => Eligibility::Eligible(single_line(&tree)),
      None => Eligibility::NoTree,
    },
    Action::Dep => {
      let tokens = sentence.tokens(parser);
      if tokens.is_empty() {
        return Eligibility::NoTokens;
      }
      let texts: Vec<String> = tokens
        .iter()
        .map(|token| token.get_attribute("text").unwrap_or_default())
        .collect();
      Eligibility::Eligible(single_line(&texts.join(" ")))
    },
    Action::Penn => match sentence.text() {
      Some(ref text) if !text.trim().is_empty() => Eligibility::Eligible(single_line(text)),
      _ => Eligibility::NoText,
    },
  }
}

/// A staged input file together with the sentences its lines belong to.
/// Line `n` of the file was written for `sentences[n]`.
pub struct StagedInput {
  /// path of the staged file
  pub path: PathBuf,
  /// the staged sentences, in line order
  pub sentences: Vec<Sentence>,
  /// skips counted while staging
  pub report: ParseReport,
}

impl StagedInput {
  /// number of staged lines
  pub fn len(&self) -> usize { self.sentences.len() }
  /// whether nothing was staged
  pub fn is_empty(&self) -> bool { self.sentences.is_empty() }
}

/// Write the parser input for `corpus` into `workdir`.
/// With `reparse`, existing dependencies under `parser` are removed from eligible sentences
/// before they are staged.
pub fn make_input_file(
  corpus: &Corpus,
  workdir: &Path,
  parser: &str,
  action: Action,
  reparse: bool,
) -> Result<StagedInput, ParseError> {
  let path = workdir.join(INPUT_FILE_NAME);
  debug!("-- staging {} input at {:?}", action, path);
  let mut writer = BufWriter::new(File::create(&path)?);
  let mut report = ParseReport::new();
  let mut staged = Vec::new();

  for sentence in corpus.sentences() {
    match eligibility(&sentence, parser, action, reparse) {
      Eligibility::Eligible(line) => {
        if reparse && action.produces_dependencies() {
          let removed = sentence.clear_dependencies(parser)?;
          if removed > 0 {
            debug!("-- removed {} dependencies from {}", removed, sentence.id());
          }
        }
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        staged.push(sentence);
      },
      skipped => skipped.count(&mut report),
    }
  }
  writer.flush()?;

  if report.existing != 0 {
    info!("Skipping {} already converted sentences.", report.existing);
  }
  Ok(StagedInput {
    path,
    sentences: staged,
    report,
  })
}
