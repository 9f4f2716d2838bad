//! Wire types exchanged between the detection server and its clients.
//!
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of the binary human detector.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Human,
    NotHuman,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Human => write!(f, "HUMAN"),
            Label::NotHuman => write!(f, "NOT_HUMAN"),
        }
    }
}

/// Labeled classification result.
///
/// `confidence_percent` is the distance of the prediction from the decision boundary, scaled to
/// percent, so it always lies in `[50, 100]`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Verdict {
    pub label: Label,
    pub confidence_percent: f32,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confidence {:.1}%)",
            self.label, self.confidence_percent
        )
    }
}

/// Body of `POST /classify_url`.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClassifyUrlReq {
    pub url: String,
}

/// Successful answer of the classify endpoints.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ClassifyResponse {
    pub label: Label,
    pub confidence_percent: f32,
    /// Human readable rendering of the verdict.
    pub summary: String,
}

impl From<Verdict> for ClassifyResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            label: verdict.label,
            confidence_percent: verdict.confidence_percent,
            summary: verdict.to_string(),
        }
    }
}

impl ClassifyResponse {
    pub fn verdict(&self) -> Verdict {
        Verdict {
            label: self.label,
            confidence_percent: self.confidence_percent,
        }
    }
}

/// Error answer of any endpoint.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_verdict_renders_one_decimal() {
        let verdict = Verdict {
            label: Label::NotHuman,
            confidence_percent: 89.96,
        };
        assert_eq!(verdict.to_string(), "NOT_HUMAN (confidence 90.0%)");

        let verdict = Verdict {
            label: Label::Human,
            confidence_percent: 50.0,
        };
        assert_eq!(verdict.to_string(), "HUMAN (confidence 50.0%)");
    }

    #[test]
    fn test_label_json_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&Label::Human)?, "\"HUMAN\"");
        assert_eq!(serde_json::to_string(&Label::NotHuman)?, "\"NOT_HUMAN\"");

        let label: Label = serde_json::from_str("\"NOT_HUMAN\"")?;
        assert_eq!(label, Label::NotHuman);

        Ok(())
    }

    #[test]
    fn test_response_carries_summary() {
        let verdict = Verdict {
            label: Label::Human,
            confidence_percent: 72.34,
        };
        let resp = ClassifyResponse::from(verdict);

        assert_eq!(resp.summary, "HUMAN (confidence 72.3%)");
        assert_eq!(resp.verdict(), verdict);
    }
}
