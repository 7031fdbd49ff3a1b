pub mod analysis;
pub mod feed;
pub mod preferences;
pub mod quality;
pub mod relevance;
pub mod session;

pub use analysis::{CachedAnalyzer, ContentAnalyzer, NoopAnalyzer, OcrClickbaitAnalyzer};
pub use feed::FeedRanker;
pub use preferences::{InteractionRecorder, RecorderHandle};
pub use quality::{quality_score, rescore, QualitySignals};
pub use relevance::RelevanceScorer;
pub use session::ViewerSessions;
