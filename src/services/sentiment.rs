use async_trait::async_trait;

/// Outcome of annotating one piece of diary content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub analyzed_content: String,
    pub positive_count: i32,
    pub negative_count: i32,
}

impl Annotation {
    /// The degraded result: content passed through untouched, nothing
    /// counted.
    #[must_use]
    pub fn neutral(content: &str) -> Self {
        Self {
            analyzed_content: content.to_string(),
            positive_count: 0,
            negative_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Majority of marked words wins; any tie, including 0-0, is neutral.
#[must_use]
pub const fn classify(positive_count: i32, negative_count: i32) -> Sentiment {
    if positive_count > negative_count {
        Sentiment::Positive
    } else if negative_count > positive_count {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Sentiment annotation seam. Implementations must not fail: when the
/// backing service is unreachable or returns nonsense, they hand back
/// `Annotation::neutral` so diary writes never depend on it.
#[async_trait]
pub trait SentimentAnnotator: Send + Sync {
    async fn annotate(&self, content: &str) -> Annotation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_majority_positive() {
        assert_eq!(classify(5, 2), Sentiment::Positive);
    }

    #[test]
    fn test_classify_majority_negative() {
        assert_eq!(classify(2, 5), Sentiment::Negative);
    }

    #[test]
    fn test_classify_tie_is_neutral() {
        assert_eq!(classify(3, 3), Sentiment::Neutral);
        assert_eq!(classify(0, 0), Sentiment::Neutral);
    }

    #[test]
    fn test_neutral_annotation_passes_content_through() {
        let annotation = Annotation::neutral("Plain day.");

        assert_eq!(annotation.analyzed_content, "Plain day.");
        assert_eq!(annotation.positive_count, 0);
        assert_eq!(annotation.negative_count, 0);
    }
}
