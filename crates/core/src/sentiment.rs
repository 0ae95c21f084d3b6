use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::TubelensError,
    oracle::{self, SentimentClassifier, with_timeout},
    text::{char_len, truncate_chars},
};

/// Overall reaction of a comment section, from average positivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effectiveness {
    #[serde(rename = "Not Effective")]
    NotEffective,
    #[serde(rename = "Somewhat Effective")]
    SomewhatEffective,
    #[serde(rename = "Effective")]
    Effective,
    #[serde(rename = "Very Effective")]
    VeryEffective,
}

impl Effectiveness {
    /// Bins are exclusive at the lower edge: exactly 0.7 is `Effective`.
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            Effectiveness::VeryEffective
        } else if score > 0.5 {
            Effectiveness::Effective
        } else if score > 0.3 {
            Effectiveness::SomewhatEffective
        } else {
            Effectiveness::NotEffective
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Effectiveness::NotEffective => "Not Effective",
            Effectiveness::SomewhatEffective => "Somewhat Effective",
            Effectiveness::Effective => "Effective",
            Effectiveness::VeryEffective => "Very Effective",
        }
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub average_sentiment_score: f64,
    pub effectiveness: Effectiveness,
    pub most_positive_comment: Option<String>,
    pub most_engaging_comment: Option<String>,
}

impl SentimentReport {
    pub fn empty() -> Self {
        Self {
            average_sentiment_score: 0.0,
            effectiveness: Effectiveness::from_score(0.0),
            most_positive_comment: None,
            most_engaging_comment: None,
        }
    }
}

/// A comment left out of every aggregate because scoring failed
#[derive(Debug)]
pub struct FailedComment {
    pub index: usize,
    pub error: TubelensError,
}

#[derive(Debug)]
pub struct SentimentAnalysis {
    pub report: SentimentReport,
    pub scored: usize,
    pub failed: Vec<FailedComment>,
}

/// Running state for the single pass over comments
#[derive(Default)]
struct Tally<'a> {
    sum: f64,
    count: usize,
    most_positive: Option<(&'a str, f64)>,
    most_engaging: Option<(&'a str, usize)>,
}

impl<'a> Tally<'a> {
    /// Ties keep the earlier comment: only a strictly greater value replaces.
    fn record(&mut self, comment: &'a str, positivity: f64) {
        self.sum += positivity;
        self.count += 1;

        if self
            .most_positive
            .is_none_or(|(_, best)| positivity > best)
        {
            self.most_positive = Some((comment, positivity));
        }

        let length = char_len(comment);
        if self.most_engaging.is_none_or(|(_, best)| length > best) {
            self.most_engaging = Some((comment, length));
        }
    }

    fn into_report(self) -> SentimentReport {
        let average = if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        };

        SentimentReport {
            average_sentiment_score: average,
            effectiveness: Effectiveness::from_score(average),
            most_positive_comment: self.most_positive.map(|(c, _)| c.to_string()),
            most_engaging_comment: self.most_engaging.map(|(c, _)| c.to_string()),
        }
    }
}

pub struct SentimentAggregator {
    classifier: Option<Arc<dyn SentimentClassifier>>,
    max_comment_chars: usize,
    timeout: Duration,
}

impl SentimentAggregator {
    pub fn new(
        classifier: Option<Arc<dyn SentimentClassifier>>,
        max_comment_chars: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            max_comment_chars,
            timeout,
        }
    }

    pub async fn analyze_sentiment(&self, comments: &[String]) -> SentimentReport {
        self.analyze(comments).await.report
    }

    /// Score every comment once and aggregate in the same pass.
    ///
    /// Engagement tracking shares the pass with scoring: a comment whose
    /// classification fails is excluded from the average and from both the
    /// most-positive and the most-engaging selection, even though its length
    /// is known. This coupling is deliberate and keeps the two extremal
    /// picks drawn from the same population as the average.
    pub async fn analyze(&self, comments: &[String]) -> SentimentAnalysis {
        let Some(classifier) = &self.classifier else {
            return SentimentAnalysis {
                report: SentimentReport::empty(),
                scored: 0,
                failed: Vec::new(),
            };
        };

        let mut tally = Tally::default();
        let mut failed = Vec::new();

        for (index, comment) in comments.iter().enumerate() {
            let input = truncate_chars(comment, self.max_comment_chars);
            let call = classifier.classify(input);
            let positivity = match with_timeout(oracle::SENTIMENT, self.timeout, call).await {
                Ok(classification) => classification.positivity(),
                Err(e) => {
                    warn!(comment = index, "Skipping comment: {}", e);
                    failed.push(FailedComment { index, error: e });
                    continue;
                }
            };

            if !positivity.is_finite() {
                warn!(comment = index, "Skipping comment with non-finite score");
                failed.push(FailedComment {
                    index,
                    error: TubelensError::oracle(oracle::SENTIMENT, "non-finite confidence"),
                });
                continue;
            }

            debug!(comment = index, positivity, "Comment scored");
            tally.record(comment, positivity);
        }

        let scored = tally.count;
        SentimentAnalysis {
            report: tally.into_report(),
            scored,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fakes::FnClassifier,
        oracle::{Classification, SentimentLabel},
    };

    fn positive(confidence: f64) -> Classification {
        Classification {
            label: SentimentLabel::Positive,
            confidence,
        }
    }

    fn aggregator(classifier: Arc<FnClassifier>) -> SentimentAggregator {
        SentimentAggregator::new(Some(classifier), 512, Duration::from_secs(5))
    }

    fn comments(items: &[&str]) -> Vec<String> {
        items.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn effectiveness_boundaries_are_strict() {
        assert_eq!(Effectiveness::from_score(0.71), Effectiveness::VeryEffective);
        assert_eq!(Effectiveness::from_score(0.7), Effectiveness::Effective);
        assert_eq!(Effectiveness::from_score(0.51), Effectiveness::Effective);
        assert_eq!(Effectiveness::from_score(0.5), Effectiveness::SomewhatEffective);
        assert_eq!(Effectiveness::from_score(0.31), Effectiveness::SomewhatEffective);
        assert_eq!(Effectiveness::from_score(0.3), Effectiveness::NotEffective);
        assert_eq!(Effectiveness::from_score(0.0), Effectiveness::NotEffective);
        assert_eq!(Effectiveness::from_score(1.0), Effectiveness::VeryEffective);
    }

    #[test]
    fn effectiveness_displays_human_labels() {
        assert_eq!(Effectiveness::VeryEffective.to_string(), "Very Effective");
        assert_eq!(
            serde_json::to_string(&Effectiveness::SomewhatEffective).unwrap(),
            "\"Somewhat Effective\""
        );
    }

    #[tokio::test]
    async fn empty_comment_list_gives_empty_report() {
        let classifier = Arc::new(FnClassifier::new(|_| Ok(positive(1.0))));
        let report = aggregator(classifier).analyze_sentiment(&[]).await;
        assert_eq!(report, SentimentReport::empty());
        assert_eq!(report.effectiveness, Effectiveness::NotEffective);
    }

    #[tokio::test]
    async fn longest_comment_is_most_engaging_regardless_of_score() {
        let classifier = Arc::new(FnClassifier::new(|text| {
            if text.len() > 100 {
                Ok(Classification {
                    label: SentimentLabel::Negative,
                    confidence: 0.99,
                })
            } else {
                Ok(positive(0.95))
            }
        }));
        let long = "a".repeat(1000);
        let report = aggregator(classifier)
            .analyze_sentiment(&[long.clone(), "hi".to_string()])
            .await;

        assert_eq!(report.most_engaging_comment.as_deref(), Some(long.as_str()));
        assert_eq!(report.most_positive_comment.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn average_uses_normalized_positivity() {
        let classifier = Arc::new(FnClassifier::new(|text| match text {
            "love it" => Ok(positive(0.9)),
            _ => Ok(Classification {
                label: SentimentLabel::Negative,
                confidence: 0.7,
            }),
        }));
        let report = aggregator(classifier)
            .analyze_sentiment(&comments(&["love it", "meh"]))
            .await;

        assert!((report.average_sentiment_score - 0.6).abs() < 1e-9);
        assert_eq!(report.effectiveness, Effectiveness::Effective);
    }

    #[tokio::test]
    async fn ties_keep_the_first_comment() {
        let classifier = Arc::new(FnClassifier::new(|_| Ok(positive(0.8))));
        let report = aggregator(classifier)
            .analyze_sentiment(&comments(&["abc", "xyz", "abc"]))
            .await;

        assert_eq!(report.most_positive_comment.as_deref(), Some("abc"));
        assert_eq!(report.most_engaging_comment.as_deref(), Some("abc"));

        let classifier = Arc::new(FnClassifier::new(|_| Ok(positive(0.8))));
        let report = aggregator(classifier)
            .analyze_sentiment(&comments(&["first", "other"]))
            .await;
        assert_eq!(report.most_positive_comment.as_deref(), Some("first"));
        assert_eq!(report.most_engaging_comment.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn failing_oracle_yields_empty_report() {
        let classifier = Arc::new(FnClassifier::new(|_| {
            Err(TubelensError::oracle(oracle::SENTIMENT, "offline"))
        }));
        let analysis = aggregator(classifier)
            .analyze(&comments(&["x", "y"]))
            .await;

        assert_eq!(analysis.report.average_sentiment_score, 0.0);
        assert_eq!(analysis.report.most_positive_comment, None);
        assert_eq!(analysis.report.most_engaging_comment, None);
        assert_eq!(analysis.scored, 0);
        assert_eq!(analysis.failed.len(), 2);
    }

    #[tokio::test]
    async fn failed_comment_is_excluded_from_every_aggregate() {
        let classifier = Arc::new(FnClassifier::new(|text| {
            if text.starts_with("LONG") {
                Err(TubelensError::oracle(oracle::SENTIMENT, "too spicy"))
            } else {
                Ok(positive(0.4))
            }
        }));
        let analysis = aggregator(classifier)
            .analyze(&comments(&["LONG comment that fails to score", "short", "tiny"]))
            .await;

        assert!((analysis.report.average_sentiment_score - 0.4).abs() < 1e-9);
        assert_eq!(analysis.report.most_engaging_comment.as_deref(), Some("short"));
        assert_eq!(analysis.report.most_positive_comment.as_deref(), Some("short"));
        assert_eq!(analysis.failed[0].index, 0);
    }

    #[tokio::test]
    async fn comments_are_truncated_before_classification() {
        let classifier = Arc::new(FnClassifier::new(|_| Ok(positive(0.5))));
        let aggregator = SentimentAggregator::new(Some(classifier.clone()), 4, Duration::from_secs(5));
        let report = aggregator
            .analyze_sentiment(&comments(&["abcdefgh"]))
            .await;

        assert_eq!(classifier.calls(), vec!["abcd"]);
        assert_eq!(report.most_engaging_comment.as_deref(), Some("abcdefgh"));
    }

    #[tokio::test]
    async fn missing_oracle_yields_empty_report() {
        let aggregator = SentimentAggregator::new(None, 512, Duration::from_secs(5));
        let report = aggregator
            .analyze_sentiment(&comments(&["great video"]))
            .await;
        assert_eq!(report, SentimentReport::empty());
    }
}
