use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use log::error;

use stanford_bridge::archive::insert_parses;
use stanford_bridge::data::Corpus;
use stanford_bridge::insertion::InsertOptions;
use stanford_bridge::process::ParserSettings;
use stanford_bridge::{Action, ParseError, RunOptions, StanfordParser};

/// Stanford parser wrapper for interaction XML corpora
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  /// Corpus in interaction XML format
  #[arg(short, long)]
  input: String,
  /// Output file in interaction XML format
  #[arg(short, long)]
  output: Option<String>,
  /// Name of the parse element
  #[arg(short, long, default_value = "McCC")]
  parse: String,
  /// convert, dep or penn
  #[arg(short, long, default_value = "convert")]
  action: Action,
  /// Keep the work directory
  #[arg(long)]
  debug: bool,
  /// Replace existing dependencies
  #[arg(long)]
  reparse: bool,
  /// Insert precomputed parses from this directory or tar archive instead of running the parser
  #[arg(long)]
  parses: Option<PathBuf>,
  /// Stanford parser directory (defaults to $STANFORD_PARSER_DIR)
  #[arg(long)]
  parser_dir: Option<PathBuf>,
  /// Parser timeout in seconds
  #[arg(long, default_value_t = 600)]
  timeout: u64,
}

fn run(args: Args) -> Result<(), ParseError> {
  let start = Instant::now();
  let report = match args.parses {
    Some(ref parse_path) => {
      let corpus = Corpus::load(&args.input)?;
      let options = InsertOptions::new(&args.parse, args.reparse);
      let report = insert_parses(&corpus, parse_path, &options)?;
      if let Some(ref output) = args.output {
        corpus.save(output)?;
      }
      report
    },
    None => {
      let mut settings = ParserSettings::default();
      if args.parser_dir.is_some() {
        settings.parser_dir = args.parser_dir.clone();
      }
      settings.timeout = Duration::from_secs(args.timeout);
      let options = RunOptions {
        parser: args.parse.clone(),
        action: args.action,
        reparse: args.reparse,
        debug: args.debug,
      };
      let summary = StanfordParser::new(settings).parse_file(&args.input, args.output.as_deref(), &options)?;
      if let Some(workdir) = summary.workdir {
        println!("-- work directory kept at {:?}", workdir);
      }
      summary.report
    },
  };
  println!("---");
  println!("Finished in {:?}s, gathered: ", start.elapsed().as_secs());
  print!("{}", report);
  Ok(())
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  if let Err(e) = run(Args::parse()) {
    error!("{}", e);
    process::exit(1);
  }
}
