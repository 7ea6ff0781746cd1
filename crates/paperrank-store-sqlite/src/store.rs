//! [`SqliteStore`], the SQLite implementation of [`PaperStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use paperrank_core::{
  paper::{DAY_FORMAT, DateCount, NewPaper, Paper, parse_day},
  rating::{CategoryRating, Rating, RatingAggregate, RatingValue},
  score::shrinkage_score,
  store::{PaperOrder, PaperQuery, PaperStore},
  user::User,
};

use crate::{
  encode::{
    PAPER_COLUMNS, RATING_COLUMNS, RawAggregate, RawCategoryRating, RawPaper,
    RawRating, RawUser, USER_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A paperrank store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, creating missing parent
  /// directories, and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_where(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn paper_where(&self, column: &'static str, value: String) -> Result<Option<Paper>> {
    let raw: Option<RawPaper> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PAPER_COLUMNS} FROM papers WHERE {column} = ?1"),
            rusqlite::params![value],
            RawPaper::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPaper::into_paper).transpose()
  }
}

/// Zero every cached score, then set the given `(paper_id, score)` rows.
fn write_scores(tx: &rusqlite::Transaction<'_>, rows: &[(String, f64)]) -> rusqlite::Result<()> {
  tx.execute("UPDATE papers SET score = 0", [])?;
  let mut stmt = tx.prepare("UPDATE papers SET score = ?1 WHERE paper_id = ?2")?;
  for (id, score) in rows {
    stmt.execute(rusqlite::params![score, id])?;
  }
  Ok(())
}

fn order_clause(order: PaperOrder) -> &'static str {
  match order {
    PaperOrder::Inserted => "ORDER BY rowid ASC",
    PaperOrder::Newest => "ORDER BY published_at DESC, score DESC, rowid ASC",
    PaperOrder::Score => "ORDER BY score DESC, rowid ASC",
  }
}

// ─── PaperStore impl ─────────────────────────────────────────────────────────

impl PaperStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, email: String, password_hash: String) -> Result<User> {
    let user = User {
      user_id: Uuid::new_v4(),
      email,
      password_hash,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let email_str = user.email.clone();
    let hash_str  = user.password_hash.clone();
    let at_str    = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO users (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![id_str, email_str, hash_str, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::EmailTaken(user.email));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id", encode_uuid(id)).await
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.user_where("email", email.to_owned()).await
  }

  // ── Papers ────────────────────────────────────────────────────────────────

  async fn add_paper(&self, input: NewPaper) -> Result<Paper> {
    input.validate()?;
    let arxiv_id = input.arxiv_id.clone();
    let paper = Paper {
      paper_id:     Uuid::new_v4(),
      arxiv_id:     input.arxiv_id,
      title:        input.title,
      summary:      input.summary,
      authors:      input.authors,
      categories:   input.categories,
      published_at: input.published_at,
      score:        0.0,
    };

    let row = (
      encode_uuid(paper.paper_id),
      paper.arxiv_id.clone(),
      paper.title.clone(),
      paper.summary.clone(),
      paper.authors.clone(),
      paper.categories.clone(),
      encode_dt(paper.published_at),
    );

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO papers (
             paper_id, arxiv_id, title, abstract, authors, categories, published_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (arxiv_id) DO NOTHING",
          rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5, row.6],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::DuplicatePaper(arxiv_id));
    }
    Ok(paper)
  }

  async fn add_papers(&self, inputs: Vec<NewPaper>) -> Result<usize> {
    for input in &inputs {
      input.validate()?;
    }
    let rows: Vec<_> = inputs
      .into_iter()
      .map(|p| {
        (
          encode_uuid(Uuid::new_v4()),
          p.arxiv_id,
          p.title,
          p.summary,
          p.authors,
          p.categories,
          encode_dt(p.published_at),
        )
      })
      .collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO papers (
               paper_id, arxiv_id, title, abstract, authors, categories, published_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (arxiv_id) DO NOTHING",
          )?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.0, row.1, row.2, row.3, row.4, row.5, row.6
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn get_paper(&self, id: Uuid) -> Result<Option<Paper>> {
    self.paper_where("paper_id", encode_uuid(id)).await
  }

  async fn get_paper_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Paper>> {
    self.paper_where("arxiv_id", arxiv_id.to_owned()).await
  }

  async fn list_papers(&self, query: &PaperQuery) -> Result<Vec<Paper>> {
    let day_str   = query.published_on.map(|d| d.format(DAY_FORMAT).to_string());
    let after_str = query.published_after.map(encode_dt);
    let order     = order_clause(query.order);
    // A negative LIMIT means "no limit" to SQLite.
    let limit_val  = query.limit.map_or(-1, |l| l as i64);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawPaper> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically.
        let mut conds: Vec<&'static str> = vec![];
        if day_str.is_some() {
          conds.push("substr(published_at, 1, 10) = ?1");
        }
        if after_str.is_some() {
          conds.push("published_at >= ?2");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {PAPER_COLUMNS}
           FROM papers
           {where_clause}
           {order}
           LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              day_str.as_deref(),
              after_str.as_deref(),
              limit_val,
              offset_val,
            ],
            RawPaper::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPaper::into_paper).collect()
  }

  async fn paper_dates(&self) -> Result<Vec<DateCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT substr(published_at, 1, 10) AS day, COUNT(*)
           FROM papers
           GROUP BY day
           ORDER BY day DESC",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(day, count)| -> Result<DateCount> {
        Ok(DateCount {
          date:  parse_day(&day)?,
          count: count.max(0) as u64,
        })
      })
      .collect()
  }

  async fn replace_scores(&self, scores: &HashMap<Uuid, f64>) -> Result<()> {
    let rows: Vec<(String, f64)> = scores
      .iter()
      .map(|(id, score)| (encode_uuid(*id), *score))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_scores(&tx, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  /// Aggregates, scores and writes in one immediate transaction, so no
  /// rating can land between the read and the write.
  async fn refresh_scores(&self) -> Result<usize> {
    let scored = self
      .conn
      .call(|conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = {
          let mut stmt = tx.prepare(
            "SELECT paper_id, AVG(rating), COUNT(*)
             FROM ratings
             GROUP BY paper_id",
          )?;
          let rows = stmt
            .query_map([], |row| {
              let average: f64 = row.get(1)?;
              let count: i64 = row.get(2)?;
              Ok((row.get::<_, String>(0)?, shrinkage_score(average, count.max(0) as u64)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        write_scores(&tx, &rows)?;
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(scored)
  }

  // ── Ratings ───────────────────────────────────────────────────────────────

  async fn upsert_rating(
    &self,
    user_id:  Uuid,
    paper_id: Uuid,
    value:    RatingValue,
  ) -> Result<Rating> {
    let rating_id_str = encode_uuid(Uuid::new_v4());
    let user_id_str   = encode_uuid(user_id);
    let paper_id_str  = encode_uuid(paper_id);
    let at_str        = encode_dt(Utc::now());
    let rating_val    = i64::from(value.get());

    let raw: Option<RawRating> = self
      .conn
      .call(move |conn| {
        let paper_exists = conn
          .query_row(
            "SELECT 1 FROM papers WHERE paper_id = ?1",
            rusqlite::params![paper_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !paper_exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO ratings (rating_id, user_id, paper_id, rating, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id, paper_id) DO UPDATE SET rating = excluded.rating",
          rusqlite::params![rating_id_str, user_id_str, paper_id_str, rating_val, at_str],
        )?;

        let raw = conn.query_row(
          &format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ?1 AND paper_id = ?2"
          ),
          rusqlite::params![user_id_str, paper_id_str],
          RawRating::from_row,
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw.ok_or(Error::PaperNotFound(paper_id))?.into_rating()
  }

  async fn ratings_for_user(&self, user_id: Uuid) -> Result<Vec<Rating>> {
    let user_id_str = encode_uuid(user_id);

    let raws: Vec<RawRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ?1 ORDER BY rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id_str], RawRating::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_rating).collect()
  }

  async fn rating_aggregates(&self) -> Result<Vec<RatingAggregate>> {
    let raws: Vec<RawAggregate> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT paper_id, AVG(rating), COUNT(*)
           FROM ratings
           GROUP BY paper_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAggregate {
              paper_id: row.get(0)?,
              average:  row.get(1)?,
              count:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAggregate::into_aggregate).collect()
  }

  async fn category_ratings(&self, user_id: Uuid) -> Result<Vec<CategoryRating>> {
    let user_id_str = encode_uuid(user_id);

    let raws: Vec<RawCategoryRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.rating, p.categories
           FROM ratings r
           JOIN papers p ON p.paper_id = r.paper_id
           WHERE r.user_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id_str], |row| {
            Ok(RawCategoryRating {
              rating:     row.get(0)?,
              categories: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawCategoryRating::into_category_rating)
      .collect()
  }
}
