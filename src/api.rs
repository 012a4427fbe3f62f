use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    AnimeCard, AnimeDetail, EpisodeDetail, Genre, HomeFeed, LetterGroup, ScheduleDay,
};
use crate::session::Session;

/// How many finished series the home page highlights.
pub const HIGHLIGHT_LIMIT: usize = 8;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115 Safari/537.36";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no data")]
    MissingData,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// One page of items plus the page count reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

/// `{ data, pagination? }` with the pagination already reduced to a count.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub data: Value,
    pub total_pages: u32,
}

impl Envelope {
    fn from_body(body: Value) -> Self {
        let total_pages = body
            .pointer("/pagination/totalPages")
            .and_then(page_count)
            .map(|n| n.clamp(1, u64::from(u32::MAX)) as u32)
            .unwrap_or(1);
        let data = match body {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Self { data, total_pages }
    }

    /// Items under `pointer` (a JSON pointer into `data`). Missing or
    /// non-array fields yield an empty list; malformed items are skipped.
    pub fn list_at<T: DeserializeOwned>(&self, pointer: &str) -> Vec<T> {
        list_at(&self.data, pointer)
    }
}

/// Page counts arrive as integers, floats or numeric strings.
fn page_count(value: &Value) -> Option<u64> {
    let from_float = |f: f64| (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64);
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(from_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    }
}

fn list_at<T: DeserializeOwned>(data: &Value, pointer: &str) -> Vec<T> {
    match data.pointer(pointer) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(v) => Some(v),
                Err(err) => {
                    tracing::debug!("skipping malformed item at {pointer}: {err}");
                    None
                }
            })
            .collect(),
        other => {
            if other.is_some() {
                tracing::warn!("{pointer} is not an array");
            }
            Vec::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `path` and returns the decoded envelope. A 401 maps to
    /// [`ApiError::Unauthorized`]; the caller decides what to invalidate.
    pub async fn get_envelope(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth: bool,
    ) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, auth, "GET");
        let mut req = self.http.get(&url).query(query);
        if auth {
            if let Some(token) = self.session.token() {
                req = req.bearer_auth(token);
            }
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let text = resp.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok(Envelope::from_body(body))
    }

    /// Fetches a card list stored under `data.<list_field>`.
    pub async fn fetch_cards(
        &self,
        path: &str,
        list_field: &str,
        query: &[(&str, String)],
        auth: bool,
    ) -> Result<PageResult<AnimeCard>, ApiError> {
        let envelope = self.get_envelope(path, query, auth).await?;
        Ok(PageResult {
            items: envelope.list_at(&format!("/{list_field}")),
            total_pages: envelope.total_pages,
        })
    }

    pub async fn home(&self) -> Result<HomeFeed, ApiError> {
        let envelope = self.get_envelope("/samehadaku/home", &[], false).await?;
        Ok(HomeFeed {
            recent: envelope.list_at("/recent/animeList"),
            batch: envelope.list_at("/batch/batchList"),
            movies: envelope.list_at("/movie/animeList"),
        })
    }

    /// The first few finished series, shown beside the home feed.
    pub async fn completed_highlights(&self) -> Result<Vec<AnimeCard>, ApiError> {
        let envelope = self.get_envelope("/otakudesu/completed", &[], false).await?;
        let mut cards: Vec<AnimeCard> = envelope.list_at("/animeList");
        cards.truncate(HIGHLIGHT_LIMIT);
        Ok(cards)
    }

    pub async fn genres(&self) -> Result<Vec<Genre>, ApiError> {
        let envelope = self.get_envelope("/samehadaku/genres", &[], false).await?;
        Ok(envelope.list_at("/genreList"))
    }

    pub async fn schedule(&self) -> Result<Vec<ScheduleDay>, ApiError> {
        let envelope = self.get_envelope("/samehadaku/schedule", &[], false).await?;
        Ok(envelope.list_at("/days"))
    }

    pub async fn anime_index(&self) -> Result<Vec<LetterGroup>, ApiError> {
        let envelope = self.get_envelope("/otakudesu/anime", &[], false).await?;
        Ok(envelope.list_at("/list"))
    }

    pub async fn anime_detail(&self, anime_id: &str) -> Result<AnimeDetail, ApiError> {
        let path = format!("/samehadaku/anime/{}", urlencoding::encode(anime_id));
        let envelope = self.get_envelope(&path, &[], false).await?;
        decode_object(envelope.data)
    }

    pub async fn episode_detail(&self, episode_id: &str) -> Result<EpisodeDetail, ApiError> {
        let path = format!("/otakudesu/episode/{}", urlencoding::encode(episode_id));
        let envelope = self.get_envelope(&path, &[], true).await?;
        decode_object(envelope.data)
    }
}

fn decode_object<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    if !data.is_object() {
        return Err(ApiError::MissingData);
    }
    Ok(serde_json::from_value(data)?)
}
