//! Transcript and comment retrieval for the CLI.
//!
//! Every source reports failure as `None` or an empty list after logging it;
//! the analyzer treats both as ordinary input.

use std::{path::PathBuf, sync::LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::{fs, io::AsyncReadExt};
use tubelens_core::{CommentSource, TranscriptSource};

static VIDEO_ID_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid video id pattern")
});
static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("valid video id pattern"));
static CAPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("valid caption pattern"));

const COMMENT_THREADS_URL: &str = "https://www.googleapis.com/youtube/v3/commentThreads";
const TIMED_TEXT_URL: &str = "https://video.google.com/timedtext";
const COMMENTS_PAGE_LIMIT: usize = 100;

/// Extract the 11-character video id from a URL, or accept a bare id
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_VIDEO_ID.is_match(input) {
        return Some(input.to_string());
    }
    VIDEO_ID_IN_URL
        .captures(input)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Transcript text from a file, or stdin for `-`
pub struct FileTranscript {
    pub path: PathBuf,
}

#[async_trait]
impl TranscriptSource for FileTranscript {
    async fn get_transcript(&self, _video_id: &str) -> Option<String> {
        let content = if self.path.as_os_str() == "-" {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .map(|_| buffer)
        } else {
            fs::read_to_string(&self.path).await
        };

        match content {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Error reading transcript {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Captions from the public timed-text endpoint, joined into one string
pub struct TimedTextTranscript {
    pub client: reqwest::Client,
    pub lang: String,
}

#[async_trait]
impl TranscriptSource for TimedTextTranscript {
    async fn get_transcript(&self, video_id: &str) -> Option<String> {
        let response = self
            .client
            .get(TIMED_TEXT_URL)
            .query(&[("lang", self.lang.as_str()), ("v", video_id)])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let body = match response {
            Ok(response) => response.text().await,
            Err(e) => Err(e),
        };

        match body {
            Ok(xml) => {
                let transcript = parse_timed_text(&xml);
                (!transcript.is_empty()).then_some(transcript)
            }
            Err(e) => {
                tracing::error!("Error fetching transcript: {}", e);
                None
            }
        }
    }
}

fn parse_timed_text(xml: &str) -> String {
    CAPTION_LINE
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|m| decode_entities(m.as_str()))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Comments from a JSON array of strings
pub struct FileComments {
    pub path: PathBuf,
}

#[async_trait]
impl CommentSource for FileComments {
    async fn get_comments(&self, _video_id: &str, max_results: usize) -> Vec<String> {
        let parsed = match fs::read_to_string(&self.path).await {
            Ok(json) => serde_json::from_str::<Vec<String>>(&json).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(mut comments) => {
                comments.truncate(max_results);
                comments
            }
            Err(e) => {
                tracing::error!("Error reading comments {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Top-level comments from the YouTube Data API v3
pub struct YoutubeComments {
    pub client: reqwest::Client,
    pub api_key: String,
}

impl YoutubeComments {
    async fn fetch(&self, video_id: &str, max_results: usize) -> reqwest::Result<Vec<String>> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_results {
            let page_size = (max_results - comments.len()).min(COMMENTS_PAGE_LIMIT).to_string();
            let mut query = vec![
                ("part", "snippet"),
                ("videoId", video_id),
                ("textFormat", "plainText"),
                ("maxResults", page_size.as_str()),
                ("key", self.api_key.as_str()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.as_str()));
            }

            let page = self
                .client
                .get(COMMENT_THREADS_URL)
                .query(&query)
                .send()
                .await?
                .error_for_status()?
                .json::<Value>()
                .await?;

            comments.extend(parse_comment_page(&page));

            page_token = page["nextPageToken"].as_str().map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        comments.truncate(max_results);
        Ok(comments)
    }
}

#[async_trait]
impl CommentSource for YoutubeComments {
    async fn get_comments(&self, video_id: &str, max_results: usize) -> Vec<String> {
        match self.fetch(video_id, max_results).await {
            Ok(comments) => comments,
            Err(e) => {
                tracing::error!("Error fetching comments: {}", e);
                Vec::new()
            }
        }
    }
}

fn parse_comment_page(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item["snippet"]["topLevelComment"]["snippet"]["textDisplay"].as_str()
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Comment source used when neither a file nor an API key is available
pub struct NoComments;

#[async_trait]
impl CommentSource for NoComments {
    async fn get_comments(&self, _video_id: &str, _max_results: usize) -> Vec<String> {
        tracing::warn!("No comment source configured; sentiment report will be empty");
        Vec::new()
    }
}
