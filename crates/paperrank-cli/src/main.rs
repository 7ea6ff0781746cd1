//! `paperrank`: operator CLI for the paperrank store.
//!
//! # Usage
//!
//! ```text
//! paperrank fetch --date 2024-01-15 --save-db
//! paperrank fetch --start-date 2024-01-01 --end-date 2024-01-31 --output jan.json --yes
//! paperrank rescore
//! paperrank rank --days-back 3 --limit 10
//! echo secret | paperrank add-user --email admin@example.com
//! ```

mod client;
mod dates;

use std::{
  io::{self, BufRead, IsTerminal, Write},
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use client::{ArxivClient, ArxivConfig};
use dates::DayRange;
use paperrank_api::{auth::hash_password, users::normalize_email};
use paperrank_arxiv::{ARXIV_API_URL, DEFAULT_CATEGORIES, DEFAULT_MAX_RESULTS};
use paperrank_core::{engine, paper::NewPaper, store::PaperStore};
use paperrank_store_sqlite::{SqliteStore, expand_tilde};
use serde::Deserialize;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE_PATH: &str = "~/.local/share/paperrank/paperrank.db";
const DEFAULT_REQUEST_DELAY_MS: u64 = 3000;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "paperrank", about = "Fetch, score, and rank arXiv papers")]
struct Args {
  /// Path to a TOML config file (store_path, arxiv_url, categories, ...).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// SQLite database file.
  #[arg(long, env = "PAPERRANK_STORE_PATH", global = true)]
  store_path: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Download papers from the arXiv export API.
  Fetch(FetchArgs),
  /// Recompute every paper's score from the stored ratings.
  Rescore,
  /// Print recent papers ordered by decayed score.
  Rank {
    #[arg(long, default_value_t = 1)]
    days_back: i64,
    #[arg(long, default_value_t = 20)]
    limit:     usize,
  },
  /// Create a user. The password is read from stdin.
  AddUser {
    #[arg(long)]
    email: String,
  },
}

#[derive(clap::Args, Debug)]
struct FetchArgs {
  /// Single day to fetch (YYYY-MM-DD). Defaults to today.
  #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
  date: Option<NaiveDate>,

  /// First day of an inclusive range.
  #[arg(long, requires = "end_date")]
  start_date: Option<NaiveDate>,

  /// Last day of an inclusive range.
  #[arg(long, requires = "start_date")]
  end_date: Option<NaiveDate>,

  /// Write the fetched papers to this JSON file.
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Insert the fetched papers into the store, skipping known arXiv ids.
  #[arg(long)]
  save_db: bool,

  /// Comma-separated categories to query instead of the defaults.
  #[arg(long, value_delimiter = ',')]
  categories: Vec<String>,

  /// Page size for each arXiv request.
  #[arg(long)]
  max_results: Option<u32>,

  /// Skip the confirmation prompt for long ranges.
  #[arg(short, long)]
  yes: bool,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct ConfigFile {
  store_path:       Option<PathBuf>,
  arxiv_url:        Option<String>,
  categories:       Option<Vec<String>>,
  max_results:      Option<u32>,
  request_delay_ms: Option<u64>,
}

impl ConfigFile {
  fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }

  /// Flags override the file, which overrides the built-in default.
  fn store_path(&self, flag: Option<PathBuf>) -> PathBuf {
    let path = flag
      .or_else(|| self.store_path.clone())
      .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
    expand_tilde(&path)
  }

  fn arxiv_config(&self, max_results: Option<u32>) -> ArxivConfig {
    ArxivConfig {
      base_url:    self.arxiv_url.clone().unwrap_or_else(|| ARXIV_API_URL.to_string()),
      max_results: max_results.or(self.max_results).unwrap_or(DEFAULT_MAX_RESULTS),
      delay:       Duration::from_millis(
        self.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
      ),
    }
  }

  fn categories(&self, flag: Vec<String>) -> Vec<String> {
    if !flag.is_empty() {
      return flag;
    }
    self
      .categories
      .clone()
      .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect())
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so `rank` and `fetch` output stays pipeable.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = ConfigFile::load(args.config.as_deref())?;
  let store_path = file_cfg.store_path(args.store_path);

  match args.command {
    Command::Fetch(fetch) => run_fetch(fetch, &file_cfg, &store_path).await,
    Command::Rescore => {
      let store = open_store(&store_path).await?;
      let scored = engine::refresh_scores(&store).await.context("refreshing scores")?;
      println!("Scored {scored} rated papers");
      Ok(())
    }
    Command::Rank { days_back, limit } => {
      let store = open_store(&store_path).await?;
      run_rank(&store, days_back, limit).await
    }
    Command::AddUser { email } => {
      let store = open_store(&store_path).await?;
      run_add_user(&store, &email).await
    }
  }
}

async fn open_store(path: &Path) -> Result<SqliteStore> {
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn run_fetch(args: FetchArgs, file_cfg: &ConfigFile, store_path: &Path) -> Result<()> {
  let today = Utc::now().date_naive();
  let range = DayRange::resolve(args.date, args.start_date, args.end_date, today)?;
  if range.needs_confirmation()
    && !args.yes
    && !confirm(&format!(
      "Fetch {} days ({} to {})?",
      range.span_days() + 1,
      range.start,
      range.end
    ))?
  {
    bail!("aborted");
  }

  let categories = file_cfg.categories(args.categories);
  let client = ArxivClient::new(file_cfg.arxiv_config(args.max_results))?;
  info!(start = %range.start, end = %range.end, categories = categories.len(), "fetching");

  let papers = client.fetch_days(&categories, range.days()).await;
  println!("Fetched {} unique papers", papers.len());

  if let Some(path) = &args.output {
    write_json(path, &papers)?;
    println!("Wrote {}", path.display());
  }

  if args.save_db {
    let store = open_store(store_path).await?;
    let inserted = store.add_papers(papers).await.context("saving papers")?;
    println!("Saved {inserted} new papers to {}", store_path.display());
  } else if args.output.is_none() {
    for paper in &papers {
      println!("{}\t{}", paper.arxiv_id, paper.title);
    }
  }

  Ok(())
}

async fn run_rank(store: &SqliteStore, days_back: i64, limit: usize) -> Result<()> {
  let window = chrono::Duration::try_days(days_back)
    .filter(|w| *w >= chrono::Duration::zero())
    .context("--days-back must be a non-negative number of days")?;
  let ranked = engine::rank_recent(store, window, Utc::now())
    .await
    .context("ranking papers")?;

  for (pos, entry) in ranked.iter().take(limit).enumerate() {
    println!(
      "{:>3}. {:>7.3}  {}  {}",
      pos + 1,
      entry.ranking_score,
      entry.paper.arxiv_id,
      entry.paper.title
    );
  }
  Ok(())
}

async fn run_add_user(store: &SqliteStore, email: &str) -> Result<()> {
  let email = normalize_email(email);
  if !email.contains('@') {
    bail!("{email:?} is not a valid email address");
  }
  if store.get_user_by_email(&email).await?.is_some() {
    bail!("user {email} already exists");
  }

  let password = read_password()?;
  if password.is_empty() {
    bail!("password must not be empty");
  }
  let password_hash =
    hash_password(&password).map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;

  let user = store.add_user(email, password_hash).await.context("creating user")?;
  println!("Created user {} ({})", user.email, user.user_id);
  Ok(())
}

// ─── Terminal helpers ─────────────────────────────────────────────────────────

fn write_json(path: &Path, papers: &[NewPaper]) -> Result<()> {
  let file = std::fs::File::create(path)
    .with_context(|| format!("creating {}", path.display()))?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, papers).context("encoding papers")?;
  writer.flush().context("writing papers")?;
  Ok(())
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
  eprint!("{question} [y/N] ");
  io::stderr().flush()?;
  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// One line from stdin, prompting only when stdin is a terminal.
fn read_password() -> Result<String> {
  let stdin = io::stdin();
  if stdin.is_terminal() {
    eprint!("Password: ");
    io::stderr().flush()?;
  }
  let mut line = String::new();
  stdin.lock().read_line(&mut line).context("reading password")?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
