//! Clickbait analysis of poster images
//!
//! The quality scorer consumes the clickbait score as a penalty signal.
//! Analyzers never surface failures through [`ContentAnalyzer::analyze`]:
//! any fault turns into the empty "no signal" result.

use crate::{error::AppResult, models::ContentAnalysis};

mod cached;
mod ocr;

pub use cached::CachedAnalyzer;
pub use ocr::OcrClickbaitAnalyzer;

/// Highest clickbait score an analyzer reports
pub const MAX_CLICKBAIT_SCORE: u8 = 5;

/// Trait for poster image classifiers
#[async_trait::async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Runs the analysis, surfacing failures
    async fn try_analyze(&self, image_uri: &str) -> AppResult<ContentAnalysis>;

    /// Runs the analysis, degrading any failure to the empty result
    async fn analyze(&self, image_uri: &str) -> ContentAnalysis {
        match self.try_analyze(image_uri).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    image_uri = %image_uri,
                    analyzer = self.name(),
                    "Content analysis failed, treating as no signal"
                );
                ContentAnalysis::default()
            }
        }
    }

    /// Analyzer name for logging
    fn name(&self) -> &'static str;
}

/// Analyzer used when no classifier is configured. Always reports no signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

#[async_trait::async_trait]
impl ContentAnalyzer for NoopAnalyzer {
    async fn try_analyze(&self, _image_uri: &str) -> AppResult<ContentAnalysis> {
        Ok(ContentAnalysis::default())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Marketing phrases grouped by how strongly they signal clickbait
#[derive(Debug, Clone, PartialEq)]
pub struct ClickbaitTaxonomy {
    pub high_risk: Vec<String>,
    pub medium_risk: Vec<String>,
    pub low_risk: Vec<String>,
}

impl Default for ClickbaitTaxonomy {
    fn default() -> Self {
        fn owned(terms: &[&str]) -> Vec<String> {
            terms.iter().map(|t| t.to_string()).collect()
        }

        Self {
            high_risk: owned(&[
                "YOU WON'T BELIEVE",
                "SHOCKING",
                "DOCTORS HATE",
                "ONE WEIRD TRICK",
                "GONE WRONG",
                "GONE SEXUAL",
                "CLICKBAIT",
                "MUST WATCH",
                "INSANE",
                "CRAZY",
                "UNBELIEVABLE",
            ]),
            medium_risk: owned(&[
                "AMAZING",
                "INCREDIBLE",
                "MIND-BLOWING",
                "EPIC",
                "ULTIMATE",
                "SECRET",
                "REVEALED",
                "EXPOSED",
                "TRUTH",
                "HIDDEN",
            ]),
            low_risk: owned(&[
                "BEST",
                "TOP",
                "WORST",
                "FIRST TIME",
                "REACTION",
                "REVIEW",
                "TUTORIAL",
                "HOW TO",
            ]),
        }
    }
}

impl ClickbaitTaxonomy {
    /// Scores extracted poster text
    ///
    /// Terms match whole words, case-insensitively. Each high-risk term is
    /// worth 2 points, each medium-risk term 1, and every two low-risk terms
    /// 1, capped at [`MAX_CLICKBAIT_SCORE`].
    pub fn score_text(&self, text: &str) -> ContentAnalysis {
        let normalized = format!(" {} ", normalize(text));

        let found = |terms: &[String]| -> Vec<String> {
            terms
                .iter()
                .filter(|term| normalized.contains(&format!(" {} ", normalize(term))))
                .cloned()
                .collect()
        };

        let high = found(&self.high_risk);
        let medium = found(&self.medium_risk);
        let low = found(&self.low_risk);

        let points = 2 * high.len() + medium.len() + low.len() / 2;
        let clickbait_score = points.min(usize::from(MAX_CLICKBAIT_SCORE)) as u8;

        let mut detected_terms = high;
        detected_terms.extend(medium);
        detected_terms.extend(low);

        ContentAnalysis {
            clickbait_score,
            detected_terms,
            extracted_text: text.to_string(),
        }
    }
}

/// Uppercases, keeps apostrophes and hyphens inside words, and collapses everything else to single spaces
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            c if c.is_alphanumeric() || c == '\'' || c == '-' => c,
            _ => ' ',
        })
        .collect::<String>()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
