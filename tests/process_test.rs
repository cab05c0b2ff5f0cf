//! Runs small shell scripts in place of the Stanford tools
#![cfg(unix)]

use std::fs;
use std::time::Duration;

use stanford_bridge::error::ParseError;
use stanford_bridge::process::{
  filtered_stderr, into_result, run_parser, ParserSettings, ProcessOutcome, OUTPUT_FILE_NAME,
  STDERR_FILE_NAME,
};
use stanford_bridge::staging::Action;

fn script(body: &str) -> ParserSettings {
  ParserSettings::with_arguments(vec!["sh".to_string(), "-c".to_string(), body.to_string()])
}

fn staged_input(dir: &tempfile::TempDir) -> std::path::PathBuf {
  let input = dir.path().join("input");
  fs::write(&input, "The dog runs .\nBirds sing .\n").unwrap();
  input
}

#[test]
fn captures_stdout_of_successful_run() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  // the input path is passed last, which `sh -c` binds to $0
  let settings = script("cat \"$0\"; echo 'Parsing [sent. 1 len. 4]' >&2");
  let outcome = run_parser(&settings, Action::Dep, &input).unwrap();
  let output_path = dir.path().join(OUTPUT_FILE_NAME);
  assert_eq!(outcome, ProcessOutcome::Success(output_path.clone()));
  assert_eq!(fs::read_to_string(&output_path).unwrap(), "The dog runs .\nBirds sing .\n");
  assert_eq!(outcome.stderr_path(), dir.path().join(STDERR_FILE_NAME));
  assert_eq!(filtered_stderr(&outcome.stderr_path()).unwrap(), "");
}

#[test]
fn non_zero_exit_is_surfaced_with_stderr() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  let settings = script("echo 'Parsing [sent. 1 len. 4]' >&2; echo 'OutOfMemoryError' >&2; exit 3");
  let outcome = run_parser(&settings, Action::Convert, &input).unwrap();
  match outcome {
    ProcessOutcome::NonZeroExit { code, .. } => assert_eq!(code, Some(3)),
    other => panic!("expected a non-zero exit, got {:?}", other),
  }
  match into_result(outcome, &settings) {
    Err(ParseError::NonZeroExit { code, stderr, .. }) => {
      assert_eq!(code, Some(3));
      assert_eq!(stderr, "OutOfMemoryError\n");
    },
    other => panic!("expected NonZeroExit, got {:?}", other),
  }
}

#[test]
fn slow_process_times_out() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  let mut settings = script("sleep 5");
  settings.timeout = Duration::from_millis(200);
  let outcome = run_parser(&settings, Action::Penn, &input).unwrap();
  assert!(matches!(outcome, ProcessOutcome::Timeout { .. }));
  assert!(matches!(into_result(outcome, &settings), Err(ParseError::Timeout { .. })));
}

#[test]
fn empty_output_is_not_success() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  let settings = script("true");
  let outcome = run_parser(&settings, Action::Dep, &input).unwrap();
  assert!(matches!(outcome, ProcessOutcome::EmptyOutput(_)));
  assert!(matches!(into_result(outcome, &settings), Err(ParseError::EmptyOutput(_))));
}

#[test]
fn missing_parser_dir_is_an_error() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  let mut settings = script("cat \"$0\"");
  settings.parser_dir = Some(dir.path().join("no-stanford-here"));
  assert!(matches!(
    run_parser(&settings, Action::Dep, &input),
    Err(ParseError::MissingPath(_))
  ));
}

#[test]
fn runs_inside_parser_dir() {
  let dir = tempfile::tempdir().unwrap();
  let input = staged_input(&dir);
  let parser_dir = tempfile::tempdir().unwrap();
  fs::write(parser_dir.path().join("marker"), "found\n").unwrap();
  let mut settings = script("cat marker");
  settings.parser_dir = Some(parser_dir.path().to_path_buf());
  let outcome = run_parser(&settings, Action::Dep, &input).unwrap();
  assert!(matches!(outcome, ProcessOutcome::Success(_)));
  assert_eq!(fs::read_to_string(dir.path().join(OUTPUT_FILE_NAME)).unwrap(), "found\n");
}

#[test]
fn argument_profiles_follow_action() {
  let settings = ParserSettings {
    java: "java -Xss8m".to_string(),
    parser_dir: None,
    arguments: None,
    ..ParserSettings::default()
  };
  let convert = settings.arguments(Action::Convert);
  assert_eq!(&convert[..3], &["java", "-mx500m", "-Xss8m"]);
  assert!(convert.contains(&"edu.stanford.nlp.trees.EnglishGrammaticalStructure".to_string()));
  assert_eq!(convert.last().unwrap(), "-treeFile");

  let penn = settings.arguments(Action::Penn);
  assert!(penn.contains(&"edu.stanford.nlp.parser.lexparser.LexicalizedParser".to_string()));
  assert!(penn.contains(&"oneline".to_string()));
  assert!(!penn.contains(&"-tokenized".to_string()));
  assert_eq!(penn.last().unwrap(), &settings.model);

  let dep = settings.arguments(Action::Dep);
  assert!(dep.contains(&"-tokenized".to_string()));
  assert!(dep.contains(&"typedDependencies".to_string()));
  assert_eq!(dep.last().unwrap(), &settings.model);
}
