pub mod chat;
pub mod huggingface;

pub use chat::ChatPunctuationRestorer;
pub use huggingface::{HuggingFaceSentimentClassifier, HuggingFaceSummarizer};
