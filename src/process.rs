//! Invocation of the external Stanford tools on a staged input file
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::ParseError;
use crate::staging::Action;

/// File name of the captured standard output, next to the staged input
pub static OUTPUT_FILE_NAME: &str = "output";
/// File name of the captured standard error, next to the captured output
pub static STDERR_FILE_NAME: &str = "stderr.log";
/// Per-sentence progress lines the parser prints on stderr
pub static PROGRESS_PREFIX: &str = "Parsing [sent.";

static POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Settings for running the Stanford tools
#[derive(Debug, Clone)]
pub struct ParserSettings {
  /// Directory holding `stanford-parser.jar` and the models; the process runs there
  pub parser_dir: Option<PathBuf>,
  /// The java command, possibly with extra JVM options (`JAVA` environment variable)
  pub java: String,
  /// JVM heap option placed right after the java executable
  pub memory: String,
  /// Grammar used by the `penn` and `dep` actions
  pub model: String,
  /// Upper bound on the parser's run time
  pub timeout: Duration,
  /// Complete argument list replacing the generated profiles; the input path is appended
  pub arguments: Option<Vec<String>>,
}

impl Default for ParserSettings {
  fn default() -> ParserSettings {
    ParserSettings {
      parser_dir: env::var_os("STANFORD_PARSER_DIR").map(PathBuf::from),
      java: env::var("JAVA").unwrap_or_else(|_| "java".to_string()),
      memory: "-mx500m".to_string(),
      model: "edu/stanford/nlp/models/lexparser/englishPCFG.ser.gz".to_string(),
      timeout: Duration::from_secs(600),
      arguments: None,
    }
  }
}

impl ParserSettings {
  /// Settings running a custom command instead of the Stanford profiles
  pub fn with_arguments(arguments: Vec<String>) -> Self {
    ParserSettings {
      parser_dir: None,
      arguments: Some(arguments),
      ..ParserSettings::default()
    }
  }

  /// The argument list for `action`, without the input path
  pub fn arguments(&self, action: Action) -> Vec<String> {
    if let Some(ref arguments) = self.arguments {
      return arguments.clone();
    }
    let mut java = self.java.split_whitespace().map(str::to_string);
    let mut args: Vec<String> = java.next().into_iter().collect();
    args.push(self.memory.clone());
    args.extend(java);
    let strs = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    match action {
      Action::Convert => args.extend(strs(&[
        "-cp",
        "stanford-parser.jar",
        "edu.stanford.nlp.trees.EnglishGrammaticalStructure",
        "-encoding",
        "utf8",
        "-CCprocessed",
        "-keepPunct",
        "-treeFile",
      ])),
      Action::Penn | Action::Dep => {
        args.extend(strs(&[
          "-cp",
          "./*",
          "edu.stanford.nlp.parser.lexparser.LexicalizedParser",
          "-sentences",
          "newline",
        ]));
        if action == Action::Penn {
          args.extend(strs(&[
            "-tokenizerOptions",
            "untokenizable=allKeep",
            "-outputFormat",
            "oneline",
          ]));
        } else {
          args.extend(strs(&[
            "-tokenized",
            "-escaper",
            "edu.stanford.nlp.process.PTBEscapingProcessor",
            "-tokenizerFactory",
            "edu.stanford.nlp.process.WhitespaceTokenizer",
            "-tokenizerMethod",
            "newCoreLabelTokenizerFactory",
            "-outputFormat",
            "typedDependencies",
          ]));
        }
        args.push(self.model.clone());
      },
    }
    args
  }
}

/// How a parser run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
  /// exited with status 0 and wrote output
  Success(PathBuf),
  /// exited with status 0 but wrote nothing
  EmptyOutput(PathBuf),
  /// killed after exceeding the timeout
  Timeout {
    /// captured standard error
    stderr_path: PathBuf,
  },
  /// exited unsuccessfully
  NonZeroExit {
    /// exit code, `None` when killed by a signal
    code: Option<i32>,
    /// captured standard error
    stderr_path: PathBuf,
  },
}

impl ProcessOutcome {
  /// where the run's standard error was captured
  pub fn stderr_path(&self) -> PathBuf {
    match self {
      ProcessOutcome::Success(output_path) | ProcessOutcome::EmptyOutput(output_path) => {
        stderr_path(output_path)
      },
      ProcessOutcome::Timeout { stderr_path } | ProcessOutcome::NonZeroExit { stderr_path, .. } => {
        stderr_path.clone()
      },
    }
  }
}

/// Path of the stderr capture belonging to `output_path`
pub fn stderr_path(output_path: &Path) -> PathBuf {
  output_path
    .parent()
    .unwrap_or_else(|| Path::new("."))
    .join(STDERR_FILE_NAME)
}

/// Run the parser for `action` on `input`, capturing stdout and stderr into the input's
/// directory, and wait for it to finish or time out
pub fn run_parser(
  settings: &ParserSettings,
  action: Action,
  input: &Path,
) -> Result<ProcessOutcome, ParseError> {
  let workdir = input.parent().unwrap_or_else(|| Path::new("."));
  let output_path = workdir.join(OUTPUT_FILE_NAME);
  let stderr_path = stderr_path(&output_path);

  let mut args = settings.arguments(action);
  if args.is_empty() {
    return Err(ParseError::MissingPath(PathBuf::from("<parser command>")));
  }
  let input_arg = fs::canonicalize(input)?;
  let program = args.remove(0);

  let mut command = Command::new(&program);
  command
    .args(&args)
    .arg(&input_arg)
    .stdin(Stdio::null())
    .stdout(File::create(&output_path)?)
    .stderr(File::create(&stderr_path)?);
  if let Some(ref dir) = settings.parser_dir {
    if !dir.is_dir() {
      return Err(ParseError::MissingPath(dir.clone()));
    }
    command.current_dir(dir);
  }
  info!("Stanford tools at: {:?}", settings.parser_dir);
  info!("Stanford tools arguments: {} {}", program, args.join(" "));

  let start = Instant::now();
  let mut child = command.spawn()?;
  let status = loop {
    if let Some(status) = child.try_wait()? {
      break status;
    }
    if start.elapsed() >= settings.timeout {
      warn!("-- parser exceeded {:?}, killing it", settings.timeout);
      // the process may have exited between the poll and the kill
      let _ = child.kill();
      child.wait()?;
      return Ok(ProcessOutcome::Timeout { stderr_path });
    }
    thread::sleep(POLL_INTERVAL);
  };
  debug!(
    "-- parser finished in {:?}s with {}",
    start.elapsed().as_secs(),
    status
  );

  if !status.success() {
    return Ok(ProcessOutcome::NonZeroExit {
      code: status.code(),
      stderr_path,
    });
  }
  if fs::metadata(&output_path)?.len() == 0 {
    return Ok(ProcessOutcome::EmptyOutput(output_path));
  }
  Ok(ProcessOutcome::Success(output_path))
}

/// The diagnostic part of a stderr capture: blank and per-sentence progress lines dropped
pub fn filtered_stderr(stderr_path: &Path) -> Result<String, ParseError> {
  let bytes = fs::read(stderr_path)?;
  let mut filtered = String::new();
  for line in String::from_utf8_lossy(&bytes).lines() {
    let line = line.trim();
    if !line.is_empty() && !line.starts_with(PROGRESS_PREFIX) {
      filtered.push_str(line);
      filtered.push('\n');
    }
  }
  Ok(filtered)
}

/// Log the filtered stderr of a run, if there is anything left to show
pub fn log_stderr(stderr_path: &Path) -> Result<(), ParseError> {
  let filtered = filtered_stderr(stderr_path)?;
  if !filtered.is_empty() {
    warn!(
      "Parser output from {:?}:\n---\n{}---",
      stderr_path, filtered
    );
  }
  Ok(())
}

/// Turn every outcome but `Success` into the corresponding hard error
pub fn into_result(outcome: ProcessOutcome, settings: &ParserSettings) -> Result<PathBuf, ParseError> {
  match outcome {
    ProcessOutcome::Success(path) => Ok(path),
    ProcessOutcome::EmptyOutput(path) => Err(ParseError::EmptyOutput(path)),
    ProcessOutcome::Timeout { stderr_path } => Err(ParseError::Timeout {
      timeout: settings.timeout,
      stderr_path,
    }),
    ProcessOutcome::NonZeroExit { code, stderr_path } => {
      let stderr = filtered_stderr(&stderr_path).unwrap_or_default();
      Err(ParseError::NonZeroExit {
        code,
        stderr_path,
        stderr,
      })
    },
  }
}
