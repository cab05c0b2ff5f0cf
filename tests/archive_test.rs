use std::fs::{self, File};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header};

use stanford_bridge::archive::{insert_parses, ParseSource};
use stanford_bridge::data::Corpus;
use stanford_bridge::error::ParseError;
use stanford_bridge::insertion::InsertOptions;

static DOC_A: &str = "det(dog-2, The-1)\nroot(ROOT-0, runs-3)\n\n\nroot(ROOT-0, sing-2)\n\n";
static DOC_B: &str = "root(ROOT-0, rains-2)\n\n\n";

fn append(builder: &mut Builder<GzEncoder<File>>, name: &str, data: &str) {
  let bytes = data.as_bytes();
  let mut header = Header::new_gnu();
  header.set_size(bytes.len() as u64);
  header.set_mode(0o644);
  header.set_cksum();
  builder.append_data(&mut header, name, bytes).unwrap();
}

fn write_archive(path: &Path, prefix: &str) {
  let file = File::create(path).unwrap();
  let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
  append(&mut builder, &format!("{}doc-a.sdepcc", prefix), DOC_A);
  append(&mut builder, &format!("{}doc-b.sd", prefix), DOC_B);
  append(&mut builder, &format!("{}unrelated.txt", prefix), "ignored");
  builder.into_inner().unwrap().finish().unwrap();
}

fn types(corpus: &Corpus, index: usize) -> Vec<String> {
  corpus.sentences()[index]
    .dependencies("McCC")
    .iter()
    .map(|d| d.get_attribute("type").unwrap_or_default())
    .collect()
}

fn check_inserted(corpus: &Corpus, report: &stanford_bridge::ParseReport) {
  assert_eq!(report.documents, 2);
  assert_eq!(report.documents_without_parse, 0);
  // doc-a: three sentences, the second with an empty block
  assert_eq!(types(corpus, 0), vec!["det", "root"]);
  assert!(types(corpus, 1).is_empty());
  assert_eq!(types(corpus, 2), vec!["root"]);
  assert_eq!(report.no_dependencies, 2);
  // doc-b: the parsed sentence keeps its dependencies, the empty one gets none
  assert_eq!(types(corpus, 3), vec!["nsubj"]);
  assert_eq!(report.existing, 1);
  assert_eq!(report.inserted, 2);
}

#[test]
fn inserts_from_directory() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("doc-a.sdepcc"), DOC_A).unwrap();
  fs::write(dir.path().join("doc-b.sd"), DOC_B).unwrap();
  let corpus = Corpus::load("tests/resources/corpus.xml").unwrap();
  let report = insert_parses(&corpus, dir.path(), &InsertOptions::new("McCC", false)).unwrap();
  check_inserted(&corpus, &report);
}

#[test]
fn inserts_from_gzipped_tar() {
  let dir = tempfile::tempdir().unwrap();
  let archive = dir.path().join("parses.tar.gz");
  write_archive(&archive, "");
  let corpus = Corpus::load("tests/resources/corpus.xml").unwrap();
  let report = insert_parses(&corpus, &archive, &InsertOptions::new("McCC", false)).unwrap();
  check_inserted(&corpus, &report);
}

#[test]
fn inserts_from_directory_inside_tar() {
  let dir = tempfile::tempdir().unwrap();
  let archive = dir.path().join("parses.tgz");
  write_archive(&archive, "./train/sd/");
  let corpus = Corpus::load("tests/resources/corpus.xml").unwrap();
  let report = insert_parses(&corpus, &archive.join("train/sd"), &InsertOptions::new("McCC", false)).unwrap();
  check_inserted(&corpus, &report);

  match ParseSource::open(&archive.join("train/sd")).unwrap() {
    ParseSource::Archive(members) => assert_eq!(members.len(), 3),
    ParseSource::Directory(_) => panic!("expected the archive to be indexed"),
  }
}

#[test]
fn documents_without_files_are_counted() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("doc-b.dep"), DOC_B).unwrap();
  let corpus = Corpus::load("tests/resources/corpus.xml").unwrap();
  let report = insert_parses(&corpus, dir.path(), &InsertOptions::new("McCC", false)).unwrap();
  assert_eq!(report.documents, 2);
  assert_eq!(report.documents_without_parse, 1);
  assert_eq!(report.sentences, 2);
  assert!(types(&corpus, 0).is_empty());
}

#[test]
fn missing_parse_path_is_an_error() {
  let corpus = Corpus::load("tests/resources/corpus.xml").unwrap();
  let result = insert_parses(&corpus, Path::new("tests/resources/no-such-parses"), &InsertOptions::new("McCC", false));
  assert!(matches!(result, Err(ParseError::MissingPath(_))));
}
