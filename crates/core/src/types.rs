use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentReport;

/// Everything derived for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub video_id: String,
    pub summary: String,
    pub formatted_transcript: String,
    pub sentiment: SentimentReport,
    pub comment_count: usize,
}
