//! Insertion of precomputed typed-dependency parses, stored per document in a directory
//! or a (gzipped) tar archive, instead of a live parser run
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use tar::Archive;

use crate::data::Corpus;
use crate::error::ParseError;
use crate::insertion::{insert_dependency_blocks, InsertOptions};
use crate::report::ParseReport;
use crate::util::path_helpers::{
  is_gzipped, normalize, open_with_ext, split_tar_path, PARSE_EXTENSIONS,
};

/// Where the per-document parse files live
pub enum ParseSource {
  /// a directory holding `<document key>.<ext>` files
  Directory(PathBuf),
  /// the members of a tar archive below the requested inner directory,
  /// keyed by their path relative to it
  Archive(HashMap<String, Vec<u8>>),
}

impl ParseSource {
  /// Open `path`: a directory, an archive, or a directory inside an archive
  /// (`parses.tar.gz/inner/dir`)
  pub fn open(path: &Path) -> Result<Self, ParseError> {
    let (archive_path, inner) = split_tar_path(path);
    let archive_path = match archive_path {
      Some(archive_path) => archive_path,
      None => {
        if !path.is_dir() {
          return Err(ParseError::MissingPath(path.to_path_buf()));
        }
        return Ok(ParseSource::Directory(path.to_path_buf()));
      },
    };
    let file = File::open(&archive_path)?;
    let reader: Box<dyn Read> = if is_gzipped(&archive_path) {
      Box::new(GzDecoder::new(file))
    } else {
      Box::new(file)
    };
    let members = read_members(reader, &inner)?;
    debug!(
      "-- indexed {} members of {:?} below {:?}",
      members.len(),
      archive_path,
      inner
    );
    Ok(ParseSource::Archive(members))
  }

  /// A reader over the parse file of the document keyed `key`, trying each known extension
  pub fn lookup(&self, key: &str) -> Option<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = match self {
      ParseSource::Directory(dir) => {
        let (_, file) = open_with_ext(&dir.join(key), &PARSE_EXTENSIONS)?;
        Box::new(BufReader::new(file))
      },
      ParseSource::Archive(members) => {
        let bytes = PARSE_EXTENSIONS
          .iter()
          .find_map(|extension| members.get(&format!("{}.{}", key, extension)))?;
        Box::new(Cursor::new(bytes.clone()))
      },
    };
    Some(reader)
  }
}

fn read_members<R: Read>(reader: R, inner: &Path) -> Result<HashMap<String, Vec<u8>>, ParseError> {
  let mut archive = Archive::new(reader);
  let mut members = HashMap::new();
  for entry in archive.entries()? {
    let mut entry = entry?;
    if !entry.header().entry_type().is_file() {
      continue;
    }
    let member_path = normalize(&entry.path()?);
    let relative = match member_path.strip_prefix(inner) {
      Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
      Err(_) => continue,
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    members.insert(relative, bytes);
  }
  Ok(members)
}

/// Insert the precomputed parses found at `parse_path` into every document of `corpus`.
/// Each document's sentences consume the blocks of its own file, in order.
pub fn insert_parses(
  corpus: &Corpus,
  parse_path: &Path,
  options: &InsertOptions,
) -> Result<ParseReport, ParseError> {
  info!("Inserting parses from {:?}", parse_path);
  let source = ParseSource::open(parse_path)?;
  let mut report = ParseReport::new();
  for document in corpus.documents() {
    report.documents += 1;
    let key = document.parse_key();
    match source.lookup(&key) {
      Some(reader) => {
        report += insert_dependency_blocks(&document.sentences(), reader, options)?;
      },
      None => {
        debug!("-- no parse file for document {:?}", key);
        report.documents_without_parse += 1;
      },
    }
  }
  info!(
    "Stanford conversion was inserted to {} sentences",
    report.inserted
  );
  Ok(report)
}
