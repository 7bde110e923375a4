use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::Timestamp;

/// Storage key for an article, assigned from a monotonic counter at insert.
///
/// Range scans over the key therefore yield insertion order, which is the
/// order the publication batch processes candidates in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Encode,
    Decode,
    Serialize,
    Deserialize,
)]
pub struct ArticleId(u64);

impl ArticleId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ArticleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Publication state of an article.
///
/// `Posted` is terminal: once an article went out, no further transition is
/// valid and the batch query never returns it again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Posted,
    Failed,
}

impl ArticleStatus {
    /// Whether moving from `self` to `next` is a valid transition.
    pub fn can_transition_to(self, next: ArticleStatus) -> bool {
        self != ArticleStatus::Posted && next != ArticleStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Posted => "posted",
            ArticleStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown article status: {value}"))]
pub struct StatusParseError {
    pub value: String,
}

impl FromStr for ArticleStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ArticleStatus::Pending),
            "posted" => Ok(ArticleStatus::Posted),
            "failed" => Ok(ArticleStatus::Failed),
            other => Err(StatusParseError {
                value: other.to_string(),
            }),
        }
    }
}

/// A syndicated article as kept in storage.
///
/// Created by ingestion (outside this system's scope); only the publication
/// batch mutates it afterwards, and only via status updates.
#[derive(Debug, Encode, Decode, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Raw HTML as ingested; formatted for publication on the way out.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
    pub original_url: Option<String>,
    pub source: Option<String>,
    pub featured_image: Option<String>,
    pub status: ArticleStatus,
    pub created_at: Timestamp,
    pub published_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use ArticleStatus::*;

        for (from, to, ok) in [
            (Pending, Posted, true),
            (Pending, Failed, true),
            (Failed, Posted, true),
            (Failed, Failed, true),
            (Posted, Posted, false),
            (Posted, Failed, false),
            (Posted, Pending, false),
            (Pending, Pending, false),
            (Failed, Pending, false),
        ] {
            assert_eq!(from.can_transition_to(to), ok, "{from} -> {to}");
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ArticleStatus::Pending).expect("Can't fail"),
            "\"pending\""
        );
        assert_eq!(
            "failed".parse::<ArticleStatus>().expect("Valid status"),
            ArticleStatus::Failed
        );
        assert!("draft".parse::<ArticleStatus>().is_err());
    }
}
