use serde::{Deserialize, Serialize};

/// Result of running the clickbait classifier over a poster image
///
/// The default value is the "no signal" outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentAnalysis {
    /// 0 (none) to 5 (heavy clickbait)
    pub clickbait_score: u8,
    pub detected_terms: Vec<String>,
    pub extracted_text: String,
}

impl ContentAnalysis {
    pub fn is_empty(&self) -> bool {
        self.clickbait_score == 0 && self.detected_terms.is_empty() && self.extracted_text.is_empty()
    }
}
