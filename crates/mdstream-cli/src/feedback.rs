use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use uuid::Uuid;

/// Reasons a reply can be rated down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    NotFunny,
    TooFunny,
    IncorrectDangerous,
    Other,
}

impl FeedbackKind {
    pub const ALL: [FeedbackKind; 4] = [
        FeedbackKind::NotFunny,
        FeedbackKind::TooFunny,
        FeedbackKind::IncorrectDangerous,
        FeedbackKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::NotFunny => "not-funny",
            FeedbackKind::TooFunny => "too-funny",
            FeedbackKind::IncorrectDangerous => "incorrect-dangerous",
            FeedbackKind::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedbackKind::NotFunny => "Not Very Funny",
            FeedbackKind::TooFunny => "Too Funny",
            FeedbackKind::IncorrectDangerous => "Incorrect & Dangerous",
            FeedbackKind::Other => "Other",
        }
    }

    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(FeedbackKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown feedback type '{}', expected one of: {}",
                    s,
                    Self::choices()
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Positive,
    Negative { kind: FeedbackKind, text: String },
}

/// A rating attached to one reply of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub conversation_id: Uuid,
    pub message_id: Uuid,
    pub feedback: Feedback,
}
