//! Error types for the arXiv feed codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed Atom feed: {0}")]
  Xml(#[from] quick_xml::Error),

  #[error("malformed attribute: {0}")]
  Attr(#[from] quick_xml::events::attributes::AttrError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
