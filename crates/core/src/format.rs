use crate::{sentiment::SentimentReport, types::VideoAnalysis};

/// Format a video analysis as human-readable markdown
pub fn format_analysis_readable(analysis: &VideoAnalysis) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Video {}\n\n", analysis.video_id));

    // Summary
    output.push_str("## Brief Summary\n\n");
    output.push_str(&analysis.summary);
    output.push_str("\n\n");

    // Sentiment
    output.push_str(&format_sentiment_readable(
        &analysis.sentiment,
        analysis.comment_count,
    ));

    // Transcript
    output.push_str("## Full Transcript\n\n");
    output.push_str(&analysis.formatted_transcript);
    output.push('\n');

    output
}

pub fn format_sentiment_readable(report: &SentimentReport, comment_count: usize) -> String {
    let mut output = String::new();

    output.push_str("## Sentiment Analysis\n\n");
    output.push_str(&format!(
        "**Average Sentiment Score:** {:.2} | **Video Effectiveness:** {} | **Comments:** {}\n\n",
        report.average_sentiment_score, report.effectiveness, comment_count
    ));

    output.push_str("### Most Positive Comment\n\n");
    output.push_str(&quote(report.most_positive_comment.as_deref()));

    output.push_str("### Most Engaging Comment\n\n");
    output.push_str(&quote(report.most_engaging_comment.as_deref()));

    output
}

fn quote(comment: Option<&str>) -> String {
    match comment {
        Some(comment) => {
            let quoted = comment
                .lines()
                .map(|line| format!("> {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n\n", quoted)
        }
        None => "_No comments could be analyzed._\n\n".to_string(),
    }
}
