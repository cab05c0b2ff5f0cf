//! The Stanford parser pipeline: stage the corpus, run the parser, insert its output.
//! Strictly sequential, one corpus per run.
use std::path::PathBuf;

use log::{info, warn};
use tempfile::TempDir;

use crate::data::Corpus;
use crate::error::ParseError;
use crate::insertion::{insert_dependency_output, insert_penn_trees, InsertOptions, RunStamp};
use crate::process::{into_result, log_stderr, run_parser, ParserSettings};
use crate::report::ParseReport;
use crate::staging::{make_input_file, Action};

/// Per-run choices
#[derive(Debug, Clone)]
pub struct RunOptions {
  /// name of the parse (and tokenization) the run reads and writes
  pub parser: String,
  /// what the parser is asked to do
  pub action: Action,
  /// discard and regenerate existing dependencies
  pub reparse: bool,
  /// keep the work directory after the run
  pub debug: bool,
}

impl RunOptions {
  /// Options for a plain run of `action` under `parser`
  pub fn new(parser: &str, action: Action) -> Self {
    RunOptions {
      parser: parser.to_string(),
      action,
      reparse: false,
      debug: false,
    }
  }
}

/// Result of a run
#[derive(Debug)]
pub struct RunSummary {
  /// the merged staging and insertion counts
  pub report: ParseReport,
  /// the work directory, when it was kept for debugging
  pub workdir: Option<PathBuf>,
}

/// Runs the Stanford tools over interaction XML corpora
#[derive(Debug, Clone, Default)]
pub struct StanfordParser {
  /// how to invoke the external parser
  pub settings: ParserSettings,
}

impl StanfordParser {
  /// construct a new `StanfordParser` with some settings
  pub fn new(settings: ParserSettings) -> Self { StanfordParser { settings } }

  /// Parse `corpus` in place. The work directory is removed on every exit path,
  /// failures included, unless `options.debug` is set.
  pub fn parse(&self, corpus: &Corpus, options: &RunOptions) -> Result<RunSummary, ParseError> {
    let workdir = TempDir::new()?;
    if options.debug {
      info!("Stanford parser workdir {:?}", workdir.path());
    }
    let result = self.parse_in(corpus, options, &workdir);
    let kept = if options.debug {
      Some(workdir.into_path())
    } else {
      if let Err(e) = workdir.close() {
        warn!("-- failed to remove work directory: {}", e);
      }
      None
    };
    result.map(|report| RunSummary {
      report,
      workdir: kept,
    })
  }

  fn parse_in(&self, corpus: &Corpus, options: &RunOptions, workdir: &TempDir) -> Result<ParseReport, ParseError> {
    let action = options.action;
    let stamp = RunStamp::now(action)?;
    info!("Stanford time stamp: {}", stamp.date);

    let staged = make_input_file(corpus, workdir.path(), &options.parser, action, options.reparse)?;
    let mut report = staged.report;
    if staged.is_empty() {
      warn!("-- no sentences eligible for {}, parser not started", action);
      return Ok(report);
    }
    info!("Running Stanford {} on {} sentences", action, staged.len());

    let outcome = run_parser(&self.settings, action, &staged.path)?;
    log_stderr(&outcome.stderr_path())?;
    let output_path = into_result(outcome, &self.settings)?;

    let insert_options = InsertOptions::new(&options.parser, true).stamped(&stamp);
    report += if action.produces_dependencies() {
      insert_dependency_output(&staged, &output_path, &insert_options)?
    } else {
      insert_penn_trees(&staged, &output_path, &insert_options)?
    };
    Ok(report)
  }

  /// Load `input`, parse it, and write the result to `output` when given
  pub fn parse_file(
    &self,
    input: &str,
    output: Option<&str>,
    options: &RunOptions,
  ) -> Result<RunSummary, ParseError> {
    let corpus = Corpus::load(input)?;
    let summary = self.parse(&corpus, options)?;
    if let Some(output) = output {
      info!("Writing output to {}", output);
      corpus.save(output)?;
    }
    Ok(summary)
  }
}
