//! Insertion of parser output into the corpus
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info, warn};

use crate::data::{Sentence, PARSE_MARKER};
use crate::dependency::{
  is_bracketed_tree, parse_dependency_block, read_line_lossy, Dependency, DependencyBlocks, TokenRef,
};
use crate::error::ParseError;
use crate::report::ParseReport;
use crate::staging::{Action, StagedInput};

/// Value of `t1` for edges governed by the synthetic root
pub static ROOT_TOKEN_ID: &str = "ROOT";
/// Source marker stamped on parses produced by this crate
pub static SOURCE_MARKER: &str = env!("CARGO_PKG_NAME");

/// Metadata shared by every parse inserted during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
  /// timestamp of the run, `%d.%m.%y %H:%M:%S`
  pub date: String,
  /// what produced the parses
  pub source: String,
  /// the action the parser ran with
  pub action: Action,
}

impl RunStamp {
  /// A stamp for a run starting now
  pub fn now(action: Action) -> Result<Self, ParseError> {
    let date = time::strftime("%d.%m.%y %H:%M:%S", &time::now())
      .map_err(|e| ParseError::Time(e.to_string()))?;
    Ok(RunStamp {
      date,
      source: SOURCE_MARKER.to_string(),
      action,
    })
  }

  /// the stamp as parse element attributes
  pub fn attributes(&self) -> Vec<(String, String)> {
    vec![
      ("stanfordSource".to_string(), self.source.clone()),
      ("stanfordDate".to_string(), self.date.clone()),
      ("depParseType".to_string(), self.action.name().to_string()),
    ]
  }
}

/// How parses are attached to sentences
#[derive(Debug, Clone)]
pub struct InsertOptions {
  /// parser name under which the parse element is kept
  pub parser: String,
  /// replace existing dependencies instead of skipping the sentence
  pub remove_existing: bool,
  /// extra attributes set on every parse element written
  pub attributes: Vec<(String, String)>,
}

impl InsertOptions {
  /// Options for `parser`, without extra attributes
  pub fn new(parser: &str, remove_existing: bool) -> Self {
    InsertOptions {
      parser: parser.to_string(),
      remove_existing,
      attributes: Vec::new(),
    }
  }

  /// Add the attributes of `stamp`
  pub fn stamped(mut self, stamp: &RunStamp) -> Self {
    self.attributes.extend(stamp.attributes());
    self
  }
}

fn mark_parse(sentence: &Sentence, options: &InsertOptions, marker: &str) -> Result<(), ParseError> {
  let mut parse = sentence.parse_or_create(&options.parser)?;
  parse
    .set_attribute(PARSE_MARKER, marker)
    .map_err(ParseError::xml)?;
  for (key, value) in &options.attributes {
    parse.set_attribute(key, value).map_err(ParseError::xml)?;
  }
  Ok(())
}

/// Map each referenced token index to a token id. Uses the parser's tokenization when it
/// has tokens; otherwise one is built from the surface words of the edges.
/// `None` when an edge points past the end of an existing tokenization.
fn resolve_token_ids(
  sentence: &Sentence,
  tokenizer: &str,
  dependencies: &[Dependency],
) -> Result<Option<BTreeMap<usize, String>>, ParseError> {
  let mut words = BTreeMap::new();
  for dependency in dependencies {
    if let Some(index) = dependency.governor.index() {
      words.entry(index).or_insert_with(|| dependency.governor_word.clone());
    }
    if let Some(index) = dependency.dependent.index() {
      words.entry(index).or_insert_with(|| dependency.dependent_word.clone());
    }
  }

  let tokens = sentence.tokens(tokenizer);
  if !tokens.is_empty() {
    let mut ids = BTreeMap::new();
    for index in words.keys() {
      match tokens.get(index - 1) {
        Some(token) => {
          let id = token
            .get_attribute("id")
            .unwrap_or_else(|| format!("bt_{}", index));
          ids.insert(*index, id);
        },
        None => return Ok(None),
      }
    }
    return Ok(Some(ids));
  }

  let mut tokenization = sentence.tokenization_or_create(tokenizer)?;
  let mut ids = BTreeMap::new();
  for (index, word) in words {
    let id = format!("st_{}", index);
    let mut token = tokenization
      .new_child(None, "token")
      .map_err(ParseError::xml)?;
    token.set_attribute("id", &id).map_err(ParseError::xml)?;
    token.set_attribute("text", &word).map_err(ParseError::xml)?;
    ids.insert(index, id);
  }
  Ok(Some(ids))
}

fn token_id<'a>(reference: TokenRef, ids: &'a BTreeMap<usize, String>) -> &'a str {
  match reference {
    TokenRef::Root => ROOT_TOKEN_ID,
    TokenRef::Token(index) => ids.get(&index).map(String::as_str).unwrap_or(ROOT_TOKEN_ID),
  }
}

/// Insert one sentence's dependency block. `block` is `None` when the parser output ended
/// before reaching this sentence. The caller has already consumed the block, so skipping
/// keeps the stream aligned with the sentence order.
pub fn insert_dependency_parse(
  sentence: &Sentence,
  block: Option<Vec<String>>,
  options: &InsertOptions,
  report: &mut ParseReport,
) -> Result<(), ParseError> {
  report.sentences += 1;
  let parser = options.parser.as_str();
  if sentence.has_dependencies(parser) {
    if options.remove_existing {
      sentence.clear_dependencies(parser)?;
    } else {
      report.existing += 1;
      return Ok(());
    }
  }

  let lines = match block {
    Some(lines) => lines,
    None => {
      warn!("-- parser output ended before sentence {:?}", sentence.id());
      report.fail += 1;
      return mark_parse(sentence, options, "fail");
    },
  };
  let dependencies = match parse_dependency_block(&lines) {
    Ok(dependencies) => dependencies,
    Err(malformed) => {
      warn!("-- malformed dependency in sentence {:?}: {:?}", sentence.id(), malformed);
      report.fail += 1;
      return mark_parse(sentence, options, "fail");
    },
  };
  if dependencies.is_empty() {
    report.no_dependencies += 1;
    return mark_parse(sentence, options, "no_dependencies");
  }

  let ids = match resolve_token_ids(sentence, parser, &dependencies)? {
    Some(ids) => ids,
    None => {
      warn!("-- dependency index beyond tokenization in sentence {:?}", sentence.id());
      report.fail += 1;
      return mark_parse(sentence, options, "fail");
    },
  };
  let mut parse = sentence.parse_or_create(parser)?;
  for (count, dependency) in dependencies.iter().enumerate() {
    let mut element = parse
      .new_child(None, "dependency")
      .map_err(ParseError::xml)?;
    element
      .set_attribute("id", &format!("sd_{}", count))
      .map_err(ParseError::xml)?;
    element
      .set_attribute("type", &dependency.relation)
      .map_err(ParseError::xml)?;
    element
      .set_attribute("t1", token_id(dependency.governor, &ids))
      .map_err(ParseError::xml)?;
    element
      .set_attribute("t2", token_id(dependency.dependent, &ids))
      .map_err(ParseError::xml)?;
  }
  report.inserted += 1;
  report.dependencies += dependencies.len() as u64;
  mark_parse(sentence, options, "ok")
}

/// Insert the dependency blocks read from `reader`, one block per sentence of `sentences`
pub fn insert_dependency_blocks<R: BufRead>(
  sentences: &[Sentence],
  reader: R,
  options: &InsertOptions,
) -> Result<ParseReport, ParseError> {
  let mut report = ParseReport::new();
  let mut blocks = DependencyBlocks::new(reader);
  for sentence in sentences {
    let block = blocks.next_block()?;
    insert_dependency_parse(sentence, block, options, &mut report)?;
  }
  report.extra_blocks = blocks.count_remaining()?;
  if report.extra_blocks > 0 {
    warn!(
      "-- {} dependency blocks were left over after the last sentence",
      report.extra_blocks
    );
  }
  Ok(report)
}

/// Insert the typed-dependency output of a parser run over `staged`
pub fn insert_dependency_output(
  staged: &StagedInput,
  output_path: &Path,
  options: &InsertOptions,
) -> Result<ParseReport, ParseError> {
  debug!("-- reading dependencies from {:?}", output_path);
  let reader = BufReader::new(File::open(output_path)?);
  let report = insert_dependency_blocks(&staged.sentences, reader, options)?;
  info!(
    "Inserted dependencies into {} of {} sentences",
    report.inserted, report.sentences
  );
  Ok(report)
}

/// Insert the one-line bracketed trees of a `penn` run over `staged`, one line per sentence
pub fn insert_penn_trees(
  staged: &StagedInput,
  output_path: &Path,
  options: &InsertOptions,
) -> Result<ParseReport, ParseError> {
  let mut report = ParseReport::new();
  let mut reader = BufReader::new(File::open(output_path)?);
  let mut buffer = Vec::new();
  for sentence in &staged.sentences {
    report.sentences += 1;
    match read_line_lossy(&mut reader, &mut buffer)? {
      Some(ref tree) if is_bracketed_tree(tree) => {
        let mut parse = sentence.parse_or_create(&options.parser)?;
        parse
          .set_attribute("pennstring", tree)
          .map_err(ParseError::xml)?;
        for (key, value) in &options.attributes {
          parse.set_attribute(key, value).map_err(ParseError::xml)?;
        }
        report.inserted += 1;
      },
      _ => {
        debug!("-- no tree for sentence {:?}", sentence.id());
        report.fail += 1;
      },
    }
  }
  while let Some(line) = read_line_lossy(&mut reader, &mut buffer)? {
    if !line.is_empty() {
      report.extra_blocks += 1;
    }
  }
  if report.extra_blocks > 0 {
    warn!("-- {} trees were left over after the last sentence", report.extra_blocks);
  }
  info!("Inserted trees into {} of {} sentences", report.inserted, report.sentences);
  Ok(report)
}
