//! Scripted oracles for unit tests.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::{
    error::Result,
    oracle::{Classification, PunctuationRestorer, SentimentClassifier, Summarizer},
};

type Script<T> = Box<dyn Fn(&str) -> Result<T> + Send + Sync>;

pub struct FnSummarizer {
    script: Script<String>,
    calls: Mutex<Vec<String>>,
    slow: Option<(&'static str, Duration)>,
}

impl FnSummarizer {
    pub fn new(script: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            slow: None,
        }
    }

    /// Sleep for `delay` before answering chunks that contain `marker`
    pub fn slow_on(mut self, marker: &'static str, delay: Duration) -> Self {
        self.slow = Some((marker, delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FnSummarizer {
    async fn summarize(&self, chunk: &str, _min_length: usize, _max_length: usize) -> Result<String> {
        self.calls.lock().unwrap().push(chunk.to_string());
        if let Some((marker, delay)) = self.slow {
            if chunk.contains(marker) {
                tokio::time::sleep(delay).await;
            }
        }
        (self.script)(chunk)
    }
}

pub struct FnPunctuator {
    script: Script<String>,
    calls: Mutex<Vec<String>>,
}

impl FnPunctuator {
    pub fn new(script: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PunctuationRestorer for FnPunctuator {
    async fn restore_punctuation(&self, chunk: &str) -> Result<String> {
        self.calls.lock().unwrap().push(chunk.to_string());
        (self.script)(chunk)
    }
}

pub struct FnClassifier {
    script: Script<Classification>,
    calls: Mutex<Vec<String>>,
}

impl FnClassifier {
    pub fn new(script: impl Fn(&str) -> Result<Classification> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentClassifier for FnClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        self.calls.lock().unwrap().push(text.to_string());
        (self.script)(text)
    }
}
