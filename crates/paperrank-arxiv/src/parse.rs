//! Atom feed reader for arXiv export-API responses.
//!
//! Pipeline:
//!   raw &str
//!     └─ quick-xml events
//!          └─ EntryBuilder (one per <entry>)
//!               └─ finish()  → NewPaper, or skipped with a warning

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use paperrank_core::paper::NewPaper;
use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};
use regex_lite::Regex;
use tracing::warn;

use crate::error::Result;

// ─── Text cleanup ────────────────────────────────────────────────────────────

static LATEX_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\\[a-zA-Z]+\{([^}]*)\}").expect("static pattern is valid")
});

/// Strip LaTeX commands of the form `\cmd{x}` down to `x` and collapse runs
/// of whitespace to a single space.
pub fn clean_text(text: &str) -> String {
  let stripped = LATEX_COMMAND.replace_all(text, "$1");
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─── Entry accumulation ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Id,
  Title,
  Summary,
  Published,
  AuthorName,
}

impl Field {
  fn from_local(local: &[u8], in_author: bool) -> Option<Self> {
    match (local, in_author) {
      (b"name", true) => Some(Self::AuthorName),
      (b"id", false) => Some(Self::Id),
      (b"title", false) => Some(Self::Title),
      (b"summary", false) => Some(Self::Summary),
      (b"published", false) => Some(Self::Published),
      _ => None,
    }
  }
}

#[derive(Default)]
struct EntryBuilder {
  id:         Option<String>,
  title:      String,
  summary:    String,
  published:  Option<String>,
  authors:    Vec<String>,
  categories: Vec<String>,
}

impl EntryBuilder {
  fn set(&mut self, field: Field, value: String) {
    match field {
      Field::Id => self.id = Some(value),
      Field::Title => self.title = value,
      Field::Summary => self.summary = value,
      Field::Published => self.published = Some(value),
      Field::AuthorName => {
        let name = value.trim();
        if !name.is_empty() {
          self.authors.push(name.to_owned());
        }
      }
    }
  }

  fn add_category(&mut self, e: &BytesStart<'_>) -> Result<()> {
    if let Some(attr) = e.try_get_attribute("term")? {
      let term = attr.unescape_value()?.trim().to_owned();
      if !term.is_empty() && !self.categories.contains(&term) {
        self.categories.push(term);
      }
    }
    Ok(())
  }

  fn finish(self) -> Option<NewPaper> {
    let Some(id) = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    else {
      warn!(title = %self.title.trim(), "skipping feed entry without <id>");
      return None;
    };
    // `http://arxiv.org/abs/2401.12345v1` → `2401.12345v1`
    let arxiv_id = id.rsplit('/').next().unwrap_or(id).to_owned();

    let Some(published) = self.published.as_deref().map(str::trim) else {
      warn!(%arxiv_id, "skipping feed entry without <published>");
      return None;
    };
    let published_at = match DateTime::parse_from_rfc3339(published) {
      Ok(dt) => dt.with_timezone(&Utc),
      Err(e) => {
        warn!(%arxiv_id, published, error = %e, "skipping feed entry with bad <published>");
        return None;
      }
    };

    let paper = NewPaper {
      arxiv_id,
      title: clean_text(&self.title),
      summary: clean_text(&self.summary),
      authors: self.authors.join(", "),
      categories: self.categories.join(" "),
      published_at,
    };
    if let Err(e) = paper.validate() {
      warn!(arxiv_id = %paper.arxiv_id, error = %e, "skipping feed entry");
      return None;
    }
    Some(paper)
  }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

fn local_name(name: &[u8]) -> &[u8] {
  // strip "prefix:" if present
  match name.iter().rposition(|&b| b == b':') {
    Some(pos) => &name[pos + 1..],
    None => name,
  }
}

pub(crate) fn parse_feed(xml: &str) -> Result<Vec<NewPaper>> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut papers = Vec::new();
  let mut entry: Option<EntryBuilder> = None;
  let mut in_author = false;
  let mut field: Option<Field> = None;
  let mut text = String::new();

  loop {
    match reader.read_event()? {
      Event::Start(e) => {
        let name = e.name();
        let local = local_name(name.as_ref());
        if local == b"entry" {
          entry = Some(EntryBuilder::default());
          in_author = false;
          field = None;
          continue;
        }
        let Some(current) = entry.as_mut() else { continue };
        match local {
          b"author" => in_author = true,
          b"category" => current.add_category(&e)?,
          _ => {
            field = Field::from_local(local, in_author);
            text.clear();
          }
        }
      }
      Event::Empty(e) => {
        if let Some(current) = entry.as_mut()
          && local_name(e.name().as_ref()) == b"category"
        {
          current.add_category(&e)?;
        }
      }
      Event::Text(e) if field.is_some() => text.push_str(&e.unescape()?),
      Event::CData(e) if field.is_some() => {
        text.push_str(&String::from_utf8_lossy(&e));
      }
      Event::End(e) => {
        let name = e.name();
        match local_name(name.as_ref()) {
          b"entry" => {
            if let Some(paper) = entry.take().and_then(EntryBuilder::finish) {
              papers.push(paper);
            }
          }
          b"author" => in_author = false,
          _ => {
            if let (Some(f), Some(current)) = (field.take(), entry.as_mut()) {
              current.set(f, std::mem::take(&mut text));
            }
          }
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }

  Ok(papers)
}
