use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::constants;
use crate::pagination::PageState;

// --- Models ---

/// A single search hit: enough to list it and show its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
  pub id: String,
  pub title: String,
  pub thumbnail_url: String,
}

/// Supplementary metadata from the `videos` endpoint, keyed by video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
  pub id: String,
  /// ISO 8601 duration as reported by the provider, e.g. `PT12M30S`.
  pub duration_iso: String,
}

/// Everything one fetch trigger produces: the current page of summaries and
/// whatever details the provider returned for them.
#[derive(Debug, Clone, Default)]
pub struct FetchedVideos {
  pub summaries: Vec<VideoSummary>,
  pub details: HashMap<String, VideoDetail>,
}

/// Provider credential. Kept out of `Debug`/`Display` so it never reaches a log line.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  fn expose(&self) -> &str {
    &self.0
  }
}

impl From<String> for ApiKey {
  fn from(key: String) -> Self {
    Self::new(key.trim())
  }
}

impl fmt::Debug for ApiKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ApiKey(***)")
  }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("could not reach YouTube: {0}")]
  Transport(#[source] reqwest::Error),
  #[error("YouTube API error {status}: {message}")]
  Api { status: u16, message: String },
  #[error("unexpected response from YouTube: {0}")]
  Decode(#[source] serde_json::Error),
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
  next_page_token: Option<String>,
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: SearchItemId,
  snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
  /// Absent for channel and playlist hits.
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
  title: String,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
  default: Option<Thumbnail>,
  medium: Option<Thumbnail>,
  high: Option<Thumbnail>,
}

impl Thumbnails {
  /// `medium` (320x180) fits the preview pane best; fall back to whatever exists.
  fn preferred_url(&self) -> Option<&str> {
    self.medium.as_ref().or(self.high.as_ref()).or(self.default.as_ref()).map(|t| t.url.as_str())
  }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
  url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
  #[serde(default)]
  items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
  id: String,
  content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
  duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: Option<String>,
}

/// Search snippets come HTML-escaped (`Mom&#39;s Yoga`); undo the handful of entities YouTube emits.
fn unescape_html(s: &str) -> String {
  if !s.contains('&') {
    return s.to_string();
  }
  s.replace("&quot;", "\"").replace("&#39;", "'").replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

fn summaries_from(resp: SearchListResponse) -> Vec<VideoSummary> {
  resp
    .items
    .into_iter()
    .filter_map(|item| {
      let id = item.id.video_id.filter(|id| !id.is_empty())?;
      let snippet = item.snippet?;
      let thumbnail_url = snippet.thumbnails.preferred_url().map(str::to_string).unwrap_or_default();
      Some(VideoSummary { id, title: unescape_html(&snippet.title), thumbnail_url })
    })
    .collect()
}

fn details_from(resp: VideoListResponse) -> HashMap<String, VideoDetail> {
  resp
    .items
    .into_iter()
    .filter_map(|item| {
      let duration_iso = item.content_details?.duration?;
      Some((item.id.clone(), VideoDetail { id: item.id, duration_iso }))
    })
    .collect()
}

/// Pull the human-readable message out of a provider error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
  serde_json::from_str::<ErrorEnvelope>(body)
    .ok()
    .and_then(|e| e.error.message)
    .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

/// The request URL carries the key, so it is stripped before the error can be displayed or logged.
fn transport_error(e: reqwest::Error) -> FetchError {
  FetchError::Transport(e.without_url())
}

fn search_params(query: &str, max_results: u32, page_token: Option<&str>) -> Vec<(&'static str, String)> {
  let mut params =
    vec![("part", "snippet".to_string()), ("q", query.to_string()), ("maxResults", max_results.to_string())];
  if let Some(token) = page_token {
    params.push(("pageToken", token.to_string()));
  }
  params
}

fn details_params(ids: &[String]) -> Vec<(&'static str, String)> {
  vec![("part", "contentDetails".to_string()), ("id", ids.join(","))]
}

/// Address of the embeddable player for a video.
pub fn embed_url(video_id: &str) -> String {
  format!("{}/{}", constants().embed_base.trim_end_matches('/'), video_id)
}

// --- Client ---

#[derive(Clone)]
pub struct YouTubeClient {
  http: Client,
  api_key: ApiKey,
  api_base: String,
}

impl YouTubeClient {
  pub fn new(api_key: ApiKey) -> Result<Self> {
    Self::with_base(api_key, &constants().api_base)
  }

  /// Client against an arbitrary provider base URL.
  pub fn with_base(api_key: ApiKey, api_base: &str) -> Result<Self> {
    let http = Client::builder()
      .user_agent(concat!("yfit/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(15))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { http, api_key, api_base: api_base.trim_end_matches('/').to_string() })
  }

  async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<T, FetchError> {
    debug!(endpoint, ?params, "youtube: request");
    let resp = self
      .http
      .get(format!("{}/{}", self.api_base, endpoint))
      .query(params)
      .query(&[("key", self.api_key.expose())])
      .send()
      .await
      .map_err(transport_error)?;
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;
    if !status.is_success() {
      return Err(FetchError::Api { status: status.as_u16(), message: api_error_message(&body) });
    }
    serde_json::from_str(&body).map_err(FetchError::Decode)
  }

  /// Search for up to `max_results` videos, starting from the first result.
  ///
  /// The provider caps a single request at 50 items, so larger windows follow
  /// `nextPageToken` until enough items arrived or the provider runs dry.
  pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoSummary>, FetchError> {
    let per_request = constants().max_results_per_request.max(1);
    let wanted = max_results as usize;
    let mut collected: Vec<VideoSummary> = Vec::with_capacity(wanted);
    let mut page_token: Option<String> = None;

    while collected.len() < wanted {
      let remaining = (wanted - collected.len()) as u32;
      let params = search_params(query, remaining.min(per_request), page_token.as_deref());
      let resp: SearchListResponse = self.get_json("search", &params).await?;
      page_token = resp.next_page_token.clone();
      // Channel and playlist hits are dropped below but still count as progress.
      let raw = resp.items.len();
      collected.extend(summaries_from(resp));
      if page_token.is_none() || raw == 0 {
        break;
      }
    }

    collected.truncate(wanted);
    Ok(collected)
  }

  /// Durations for the given ids. Ids the provider omits are simply absent from the map.
  pub async fn fetch_details(&self, ids: &[String]) -> Result<HashMap<String, VideoDetail>, FetchError> {
    let mut details = HashMap::with_capacity(ids.len());
    for batch in ids.chunks(constants().max_ids_per_request.max(1)) {
      let resp: VideoListResponse = self.get_json("videos", &details_params(batch)).await?;
      details.extend(details_from(resp));
    }
    Ok(details)
  }

  /// Search, cut out the current page, then look up durations for that page.
  ///
  /// A failed detail call is not fatal: the page is returned without durations.
  pub async fn fetch_page(&self, query: &str, page: PageState) -> Result<FetchedVideos, FetchError> {
    let mut all = self.search(query, page.max_results()).await?;
    let window = page.window(all.len());
    let summaries: Vec<VideoSummary> = all.drain(window).collect();
    let ids: Vec<String> = summaries.iter().map(|s| s.id.clone()).collect();

    let details = match self.fetch_details(&ids).await {
      Ok(d) => d,
      Err(e) => {
        warn!(err = %e, query, page = page.current(), "youtube: detail fetch failed, durations unavailable");
        HashMap::new()
      }
    };
    Ok(FetchedVideos { summaries, details })
  }

  pub async fn fetch_thumbnail(&self, url: &str) -> Result<DynamicImage> {
    if url.is_empty() {
      return Err(anyhow!("Video has no thumbnail"));
    }
    let response = self.http.get(url).send().await.with_context(|| format!("Failed to request thumbnail {}", url))?;
    if !response.status().is_success() {
      return Err(anyhow!("Thumbnail request failed with {}", response.status()));
    }
    let bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
    image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
  }
}
