//! Article lifecycle states

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Workflow state of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleState {
    Collected,
    Extracting,
    Extracted,
    Translating,
    Translated,
    Scoring,
    Scored,
    Completed,
    Failed,
}

impl ArticleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleState::Collected => "collected",
            ArticleState::Extracting => "extracting",
            ArticleState::Extracted => "extracted",
            ArticleState::Translating => "translating",
            ArticleState::Translated => "translated",
            ArticleState::Scoring => "scoring",
            ArticleState::Scored => "scored",
            ArticleState::Completed => "completed",
            ArticleState::Failed => "failed",
        }
    }

    /// The states this state may legally transition to
    pub fn valid_targets(&self) -> &'static [ArticleState] {
        use ArticleState::*;
        match self {
            Collected => &[Extracting, Failed],
            Extracting => &[Extracted, Failed],
            Extracted => &[Translating, Scoring, Failed],
            Translating => &[Translated, Failed],
            Translated => &[Scoring, Failed],
            Scoring => &[Scored, Failed],
            Scored => &[Completed, Failed],
            Completed => &[],
            Failed => &[Collected],
        }
    }

    pub fn can_transition_to(&self, target: ArticleState) -> bool {
        self.valid_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ArticleState::Completed)
    }
}

impl std::fmt::Display for ArticleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArticleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collected" => Ok(ArticleState::Collected),
            "extracting" => Ok(ArticleState::Extracting),
            "extracted" => Ok(ArticleState::Extracted),
            "translating" => Ok(ArticleState::Translating),
            "translated" => Ok(ArticleState::Translated),
            "scoring" => Ok(ArticleState::Scoring),
            "scored" => Ok(ArticleState::Scored),
            "completed" => Ok(ArticleState::Completed),
            "failed" => Ok(ArticleState::Failed),
            other => Err(format!("unknown article state: {other}")),
        }
    }
}
