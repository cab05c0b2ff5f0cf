//! Data structures for convenient access to an interaction XML corpus:
//! documents, their sentences, and the per-parser analyses stored on them
use libxml::parser::Parser;
use libxml::tree::{Document as XmlDoc, Node};
use libxml::xpath::Context;

use crate::error::ParseError;

/// Name of the marker attribute stamped on a parse element once dependencies were inserted
pub static PARSE_MARKER: &str = "stanford";

/// An interaction XML corpus, owned for the duration of a run and mutated in place
pub struct Corpus {
  /// The DOM of the corpus
  pub dom: XmlDoc,
  /// The file path the corpus was loaded from, if any
  pub path: Option<String>,
}

/// A `document` element of the corpus
#[derive(Clone)]
pub struct Document {
  /// the underlying element
  pub node: Node,
  /// 1-based position of the document in the corpus
  pub position: usize,
}

/// A `sentence` element, with accessors for its text, tokenizations and parses
#[derive(Clone)]
pub struct Sentence {
  /// the underlying element
  pub node: Node,
}

impl Corpus {
  /// Load a corpus from an XML file
  pub fn load(filepath: &str) -> Result<Self, ParseError> {
    let dom = Parser::default().parse_file(filepath)?;
    Ok(Corpus {
      dom,
      path: Some(filepath.to_string()),
    })
  }

  /// Load a corpus from an in-memory XML string
  pub fn from_string(xml: &str) -> Result<Self, ParseError> {
    let dom = Parser::default().parse_string(xml)?;
    Ok(Corpus { dom, path: None })
  }

  /// Write the (possibly modified) corpus to `filepath`
  pub fn save(&self, filepath: &str) -> Result<(), ParseError> {
    match self.dom.save_file(filepath) {
      Ok(_) => Ok(()),
      Err(_) => Err(ParseError::Xml(format!("failed to write corpus to {}", filepath))),
    }
  }

  /// All `document` elements, in document order
  pub fn documents(&self) -> Vec<Document> {
    let xpath_context = match Context::new(&self.dom) {
      Ok(context) => context,
      Err(_) => return Vec::new(),
    };
    match xpath_context.evaluate("//document") {
      Ok(found_payload) => found_payload
        .get_nodes_as_vec()
        .into_iter()
        .enumerate()
        .map(|(index, node)| Document {
          node,
          position: index + 1,
        })
        .collect(),
      _ => Vec::new(),
    }
  }

  /// All sentences of the corpus, document by document.
  /// Every phase of a run walks the corpus through this one traversal.
  pub fn sentences(&self) -> Vec<Sentence> {
    self
      .documents()
      .iter()
      .flat_map(|document| document.sentences())
      .collect()
  }
}

impl Document {
  /// The `id` attribute, if any
  pub fn id(&self) -> Option<String> { self.node.get_attribute("id") }

  /// Key under which precomputed parse files are stored for this document:
  /// `origId`, then `id`, then a positional `CORPUS.dN` name
  pub fn parse_key(&self) -> String {
    self
      .node
      .get_attribute("origId")
      .or_else(|| self.id())
      .unwrap_or_else(|| format!("CORPUS.d{}", self.position))
  }

  /// The sentences of this document, including those nested in sections
  pub fn sentences(&self) -> Vec<Sentence> {
    let mut found = Vec::new();
    collect_sentences(&self.node, &mut found);
    found
  }
}

fn collect_sentences(node: &Node, found: &mut Vec<Sentence>) {
  for child in node.get_child_elements() {
    if child.get_name() == "sentence" {
      found.push(Sentence { node: child });
    } else {
      collect_sentences(&child, found);
    }
  }
}

/// First child element named `name` whose attribute `key` equals `value`
fn find_child(node: &Node, name: &str, key: &str, value: &str) -> Option<Node> {
  node
    .get_child_elements()
    .into_iter()
    .find(|child| child.get_name() == name && child.get_attribute(key).as_deref() == Some(value))
}

fn children_named(node: &Node, name: &str) -> Vec<Node> {
  node
    .get_child_elements()
    .into_iter()
    .filter(|child| child.get_name() == name)
    .collect()
}

impl Sentence {
  /// The `id` attribute, or an empty string
  pub fn id(&self) -> String { self.node.get_attribute("id").unwrap_or_default() }

  /// The raw `text` attribute
  pub fn text(&self) -> Option<String> { self.node.get_attribute("text") }

  fn analyses(&self) -> Option<Node> {
    self
      .node
      .get_child_elements()
      .into_iter()
      .find(|child| child.get_name() == "analyses")
  }

  fn analyses_or_create(&self) -> Result<Node, ParseError> {
    match self.analyses() {
      Some(analyses) => Ok(analyses),
      None => {
        let mut node = self.node.clone();
        node.new_child(None, "analyses").map_err(ParseError::xml)
      },
    }
  }

  /// The parse element of `parser`, if present
  pub fn parse(&self, parser: &str) -> Option<Node> {
    self
      .analyses()
      .and_then(|analyses| find_child(&analyses, "parse", "parser", parser))
  }

  /// The parse element of `parser`, created empty if missing
  pub fn parse_or_create(&self, parser: &str) -> Result<Node, ParseError> {
    if let Some(parse) = self.parse(parser) {
      return Ok(parse);
    }
    let mut analyses = self.analyses_or_create()?;
    let mut parse = analyses.new_child(None, "parse").map_err(ParseError::xml)?;
    parse.set_attribute("parser", parser).map_err(ParseError::xml)?;
    Ok(parse)
  }

  /// The non-empty bracketed tree stored under `parser`
  pub fn penn_tree(&self, parser: &str) -> Option<String> {
    self
      .parse(parser)
      .and_then(|parse| parse.get_attribute("pennstring"))
      .filter(|tree| !tree.is_empty())
  }

  /// The tokenization element produced by `tokenizer`, if present
  pub fn tokenization(&self, tokenizer: &str) -> Option<Node> {
    self
      .analyses()
      .and_then(|analyses| find_child(&analyses, "tokenization", "tokenizer", tokenizer))
  }

  /// The tokenization of `tokenizer`, created empty if missing
  pub fn tokenization_or_create(&self, tokenizer: &str) -> Result<Node, ParseError> {
    if let Some(tokenization) = self.tokenization(tokenizer) {
      return Ok(tokenization);
    }
    let mut analyses = self.analyses_or_create()?;
    let mut tokenization = analyses
      .new_child(None, "tokenization")
      .map_err(ParseError::xml)?;
    tokenization
      .set_attribute("tokenizer", tokenizer)
      .map_err(ParseError::xml)?;
    Ok(tokenization)
  }

  /// The ordered `token` elements of the `tokenizer` tokenization
  pub fn tokens(&self, tokenizer: &str) -> Vec<Node> {
    match self.tokenization(tokenizer) {
      Some(tokenization) => children_named(&tokenization, "token"),
      None => Vec::new(),
    }
  }

  /// The `dependency` elements stored under `parser`
  pub fn dependencies(&self, parser: &str) -> Vec<Node> {
    match self.parse(parser) {
      Some(parse) => children_named(&parse, "dependency"),
      None => Vec::new(),
    }
  }

  /// Whether `parser` already holds dependencies for this sentence
  pub fn has_dependencies(&self, parser: &str) -> bool { !self.dependencies(parser).is_empty() }

  /// Drop the dependencies under `parser`, together with the parse marker attribute.
  /// Returns how many edges were removed.
  pub fn clear_dependencies(&self, parser: &str) -> Result<usize, ParseError> {
    let mut parse = match self.parse(parser) {
      Some(parse) => parse,
      None => return Ok(0),
    };
    let dependencies = children_named(&parse, "dependency");
    let removed = dependencies.len();
    for mut dependency in dependencies {
      dependency.unlink();
    }
    if parse.get_attribute(PARSE_MARKER).is_some() {
      parse
        .remove_attribute(PARSE_MARKER)
        .map_err(ParseError::xml)?;
    }
    Ok(removed)
  }
}
