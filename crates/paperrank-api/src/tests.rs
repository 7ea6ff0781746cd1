//! Router tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use paperrank_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiState, TokenIssuer, api_router};

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn make_state() -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  ApiState::new(
    Arc::new(store),
    TokenIssuer::new("test-secret", Duration::minutes(30)),
  )
}

async fn oneshot_raw(
  state:        &ApiState<SqliteStore>,
  method:       &str,
  uri:          &str,
  token:        Option<&str>,
  content_type: Option<&str>,
  body:         String,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  if let Some(ct) = content_type {
    builder = builder.header(header::CONTENT_TYPE, ct);
  }
  let req = builder.body(Body::from(body)).unwrap();
  api_router(state.clone()).oneshot(req).await.unwrap()
}

async fn read_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  }
}

async fn get(state: &ApiState<SqliteStore>, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
  let resp = oneshot_raw(state, "GET", uri, token, None, String::new()).await;
  (resp.status(), read_json(resp).await)
}

async fn post_json(
  state: &ApiState<SqliteStore>,
  uri:   &str,
  token: Option<&str>,
  body:  Value,
) -> (StatusCode, Value) {
  let resp = oneshot_raw(
    state,
    "POST",
    uri,
    token,
    Some("application/json"),
    body.to_string(),
  )
  .await;
  (resp.status(), read_json(resp).await)
}

async fn login_raw(state: &ApiState<SqliteStore>, email: &str, password: &str) -> Response {
  oneshot_raw(
    state,
    "POST",
    "/users/token",
    None,
    Some("application/x-www-form-urlencoded"),
    format!("username={email}&password={password}"),
  )
  .await
}

/// Register `email` and return a bearer token for it.
async fn signup(state: &ApiState<SqliteStore>, email: &str) -> String {
  let (status, _) = post_json(
    state,
    "/users/register",
    None,
    json!({ "email": email, "password": "secret" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let resp = login_raw(state, email, "secret").await;
  assert_eq!(resp.status(), StatusCode::OK);
  read_json(resp).await["access_token"]
    .as_str()
    .unwrap()
    .to_owned()
}

/// Create a paper through the API and return its id.
async fn add_paper(
  state:        &ApiState<SqliteStore>,
  token:        &str,
  arxiv_id:     &str,
  categories:   &str,
  published_at: DateTime<Utc>,
) -> String {
  let (status, body) = post_json(
    state,
    "/papers",
    Some(token),
    json!({
      "arxiv_id":     arxiv_id,
      "title":        format!("Paper {arxiv_id}"),
      "abstract":     "An abstract.",
      "authors":      "Alice Liddell, Bob Smith",
      "categories":   categories,
      "published_at": published_at.to_rfc3339(),
    }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["paper_id"].as_str().unwrap().to_owned()
}

async fn rate(
  state:    &ApiState<SqliteStore>,
  token:    &str,
  paper_id: &str,
  value:    i64,
) -> (StatusCode, Value) {
  post_json(
    state,
    &format!("/papers/{paper_id}/rate"),
    Some(token),
    json!({ "rating_value": value }),
  )
  .await
}

fn ids(body: &Value, field: &str) -> Vec<String> {
  body
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p[field].as_str().unwrap().to_owned())
    .collect()
}

// ── Users ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_returns_user_without_hash() {
  let state = make_state().await;
  let (status, body) = post_json(
    &state,
    "/users/register",
    None,
    json!({ "email": " Alice@Example.com ", "password": "secret" }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["email"], "alice@example.com");
  assert!(body.get("password_hash").is_none());
  assert!(body["user_id"].is_string());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
  let state = make_state().await;
  signup(&state, "alice@example.com").await;

  let (status, body) = post_json(
    &state,
    "/users/register",
    None,
    json!({ "email": "ALICE@example.com", "password": "other" }),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn register_rejects_bad_input() {
  let state = make_state().await;
  let (status, _) = post_json(
    &state,
    "/users/register",
    None,
    json!({ "email": "not-an-email", "password": "secret" }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post_json(
    &state,
    "/users/register",
    None,
    json!({ "email": "a@example.com", "password": "" }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_is_bearer() {
  let state = make_state().await;
  signup(&state, "alice@example.com").await;

  let resp = login_raw(&state, "alice@example.com", "secret").await;
  let body = read_json(resp).await;
  assert_eq!(body["token_type"], "bearer");
  assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_is_401() {
  let state = make_state().await;
  signup(&state, "alice@example.com").await;

  let resp = login_raw(&state, "alice@example.com", "wrong").await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
  assert_eq!(read_json(resp).await["error"], "Incorrect email or password");
}

#[tokio::test]
async fn unknown_user_is_401() {
  let state = make_state().await;
  let resp = login_raw(&state, "nobody@example.com", "secret").await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_credentials_are_400() {
  let state = make_state().await;
  let resp = login_raw(&state, "", "").await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_returns_current_user() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;

  let (status, body) = get(&state, "/users/me", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn protected_routes_require_token() {
  let state = make_state().await;
  for uri in ["/users/me", "/users/me/ratings", "/papers", "/papers/dates"] {
    let resp = oneshot_raw(&state, "GET", uri, None, None, String::new()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
  }
}

#[tokio::test]
async fn forged_token_is_401() {
  let state = make_state().await;
  signup(&state, "alice@example.com").await;

  let (status, _) = get(&state, "/users/me", Some("not.a.jwt")).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let foreign = TokenIssuer::new("other-secret", Duration::minutes(30))
    .issue(Uuid::new_v4())
    .unwrap();
  let (status, _) = get(&state, "/users/me", Some(&foreign)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;

  let req = Request::builder()
    .uri("/users/me")
    .header(header::AUTHORIZATION, format!("bearer {token}"))
    .body(Body::empty())
    .unwrap();
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(read_json(resp).await["email"], "alice@example.com");
}

#[tokio::test]
async fn token_for_missing_user_is_401() {
  let state = make_state().await;
  let token = state.tokens.issue(Uuid::new_v4()).unwrap();
  let (status, body) = get(&state, "/users/me", Some(&token)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "unknown user");
}

// ── Papers ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_paper() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  let published = Utc.with_ymd_and_hms(2024, 1, 15, 17, 30, 0).unwrap();
  let id = add_paper(&state, &token, "2401.00001v1", "cs.AI cs.LG", published).await;

  let (status, body) = get(&state, &format!("/papers/{id}"), Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["arxiv_id"], "2401.00001v1");
  assert_eq!(body["abstract"], "An abstract.");
  assert_eq!(body["score"], 0.0);
}

#[tokio::test]
async fn duplicate_arxiv_id_is_conflict() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  add_paper(&state, &token, "2401.00001v1", "cs.AI", Utc::now()).await;

  let (status, _) = post_json(
    &state,
    "/papers",
    Some(&token),
    json!({
      "arxiv_id": "2401.00001v1",
      "title": "Again",
      "abstract": "",
      "authors": "",
      "categories": "cs.AI",
      "published_at": Utc::now().to_rfc3339(),
    }),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn five_digit_publication_year_is_bad_request() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  add_paper(&state, &token, "2401.00001v1", "cs.AI", Utc::now()).await;

  let (status, body) = post_json(
    &state,
    "/papers",
    Some(&token),
    json!({
      "arxiv_id": "2401.99999v1",
      "title": "Far future",
      "abstract": "",
      "authors": "",
      "categories": "cs.AI",
      "published_at": "+10000-01-01T00:00:00Z",
    }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
  assert!(body["error"].as_str().unwrap().contains("9999"));

  let (status, body) = get(&state, "/papers", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
  let (status, _) = get(&state, "/papers/dates", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = get(&state, "/users/me/recommendations", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_paper_is_404() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;

  let (status, body) = get(&state, &format!("/papers/{}", Uuid::new_v4()), Some(&token)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn list_is_newest_first_and_paged() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
  add_paper(&state, &token, "a", "cs.AI", day(13)).await;
  add_paper(&state, &token, "b", "cs.AI", day(15)).await;
  add_paper(&state, &token, "c", "cs.AI", day(14)).await;

  let (_, body) = get(&state, "/papers", Some(&token)).await;
  assert_eq!(ids(&body, "arxiv_id"), ["b", "c", "a"]);

  let (_, body) = get(&state, "/papers?skip=1&limit=1", Some(&token)).await;
  assert_eq!(ids(&body, "arxiv_id"), ["c"]);
}

#[tokio::test]
async fn dates_are_counted_newest_first() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  add_paper(&state, &token, "a", "cs.AI", Utc.with_ymd_and_hms(2024, 1, 14, 8, 0, 0).unwrap()).await;
  add_paper(&state, &token, "b", "cs.AI", Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()).await;
  add_paper(&state, &token, "c", "cs.AI", Utc.with_ymd_and_hms(2024, 1, 15, 22, 0, 0).unwrap()).await;

  let (status, body) = get(&state, "/papers/dates", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({ "dates": [
      { "date": "2024-01-15", "count": 2 },
      { "date": "2024-01-14", "count": 1 },
    ]})
  );
}

#[tokio::test]
async fn by_date_orders_by_score() {
  let state = make_state().await;
  let alice = signup(&state, "alice@example.com").await;
  let on_day = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
  let low = add_paper(&state, &alice, "low", "cs.AI", on_day).await;
  let high = add_paper(&state, &alice, "high", "cs.AI", on_day).await;
  add_paper(&state, &alice, "other-day", "cs.AI", on_day + Duration::days(1)).await;
  rate(&state, &alice, &low, 1).await;
  rate(&state, &alice, &high, 5).await;

  let (status, body) = get(&state, "/papers/by-date/2024-01-15", Some(&alice)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body, "arxiv_id"), ["high", "low"]);
}

#[tokio::test]
async fn by_date_rejects_malformed_date() {
  let state = make_state().await;
  let token = signup(&state, "alice@example.com").await;
  let (status, body) = get(&state, "/papers/by-date/15-01-2024", Some(&token)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
}

#[tokio::test]
async fn ranked_respects_window_and_limit() {
  let state = make_state().await;
  let alice = signup(&state, "alice@example.com").await;
  let now = Utc::now();
  let fresh = add_paper(&state, &alice, "fresh", "cs.AI", now - Duration::hours(1)).await;
  let older = add_paper(&state, &alice, "older", "cs.AI", now - Duration::hours(20)).await;
  let stale = add_paper(&state, &alice, "stale", "cs.AI", now - Duration::days(3)).await;
  for id in [&fresh, &older, &stale] {
    rate(&state, &alice, id, 4).await;
  }

  let (status, body) = get(&state, "/papers/ranked", Some(&alice)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body, "arxiv_id"), ["fresh", "older"]);
  assert!(body[0]["ranking_score"].as_f64().unwrap() > body[1]["ranking_score"].as_f64().unwrap());

  let (_, body) = get(&state, "/papers/ranked?days_back=7&limit=2", Some(&alice)).await;
  assert_eq!(ids(&body, "arxiv_id"), ["fresh", "older"]);

  let (_, body) = get(&state, "/papers/ranked?days_back=7", Some(&alice)).await;
  assert_eq!(ids(&body, "arxiv_id"), ["fresh", "older", "stale"]);
}

// ── Ratings ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rating_twice_updates_and_rescores() {
  let state = make_state().await;
  let alice = signup(&state, "alice@example.com").await;
  let bob = signup(&state, "bob@example.com").await;
  let id = add_paper(&state, &alice, "a", "cs.AI", Utc::now()).await;

  let (status, first) = rate(&state, &alice, &id, 2).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["rating"], 2);

  let (_, second) = rate(&state, &alice, &id, 5).await;
  assert_eq!(second["rating_id"], first["rating_id"]);
  assert_eq!(second["rating"], 5);

  let (_, ratings) = get(&state, "/users/me/ratings", Some(&alice)).await;
  assert_eq!(ratings.as_array().unwrap().len(), 1);
  assert_eq!(ratings[0]["rating"], 5);

  rate(&state, &bob, &id, 4).await;
  let (_, paper) = get(&state, &format!("/papers/{id}"), Some(&alice)).await;
  assert!((paper["score"].as_f64().unwrap() - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn rating_out_of_range_is_400() {
  let state = make_state().await;
  let alice = signup(&state, "alice@example.com").await;
  let id = add_paper(&state, &alice, "a", "cs.AI", Utc::now()).await;

  for value in [-1, 6, 100] {
    let (status, _) = rate(&state, &alice, &id, value).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rating {value}");
  }
  let (status, _) = rate(&state, &alice, &id, 0).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rating_missing_paper_is_404() {
  let state = make_state().await;
  let alice = signup(&state, "alice@example.com").await;
  let (status, _) = rate(&state, &alice, &Uuid::new_v4().to_string(), 3).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Recommendations ───────────────────────────────────────────────────────────

#[tokio::test]
async fn new_user_gets_score_ranking() {
  let state = make_state().await;
  let rater = signup(&state, "rater@example.com").await;
  let newcomer = signup(&state, "new@example.com").await;

  let mut papers = vec![];
  for (i, value) in [2, 5, 3].into_iter().enumerate() {
    let id = add_paper(&state, &rater, &format!("p{i}"), "cs.AI", Utc::now()).await;
    rate(&state, &rater, &id, value).await;
    papers.push(id);
  }

  let (status, body) = get(&state, "/users/me/recommendations", Some(&newcomer)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body, "paper_id"), [papers[1].clone(), papers[2].clone(), papers[0].clone()]);

  let (_, body) = get(&state, "/users/me/recommendations?limit=1", Some(&newcomer)).await;
  assert_eq!(ids(&body, "paper_id"), [papers[1].clone()]);
}

#[tokio::test]
async fn recommendations_follow_category_taste() {
  let state = make_state().await;
  let crowd = signup(&state, "crowd@example.com").await;
  let alice = signup(&state, "alice@example.com").await;

  let liked = add_paper(&state, &crowd, "liked", "cs.AI", Utc::now()).await;
  let disliked = add_paper(&state, &crowd, "disliked", "cs.LG", Utc::now()).await;
  let ai = add_paper(&state, &crowd, "ai", "cs.AI", Utc::now()).await;
  let lg = add_paper(&state, &crowd, "lg", "cs.LG", Utc::now()).await;

  rate(&state, &crowd, &ai, 3).await;
  rate(&state, &crowd, &lg, 4).await;
  rate(&state, &alice, &liked, 5).await;
  rate(&state, &alice, &disliked, 0).await;

  let (_, body) = get(&state, "/users/me/recommendations", Some(&alice)).await;
  assert_eq!(ids(&body, "arxiv_id"), ["liked", "ai", "lg", "disliked"]);
}
