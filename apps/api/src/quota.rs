//! Free-tier quota gate.
//!
//! Usage is not stored: it is the number of history rows for (user, tool).
//! The gate is read-only; a successful run writes the history row that
//! counts against the next check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthUser, Plan};
use crate::errors::AppError;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolKind {
    ResumeAnalyzer,
    CoverLetterGenerator,
    RoadmapGenerator,
    MockInterview,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::ResumeAnalyzer,
        ToolKind::CoverLetterGenerator,
        ToolKind::RoadmapGenerator,
        ToolKind::MockInterview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::ResumeAnalyzer => "RESUME_ANALYZER",
            ToolKind::CoverLetterGenerator => "COVER_LETTER_GENERATOR",
            ToolKind::RoadmapGenerator => "ROADMAP_GENERATOR",
            ToolKind::MockInterview => "MOCK_INTERVIEW",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::ResumeAnalyzer => "resume analyzer",
            ToolKind::CoverLetterGenerator => "cover letter generator",
            ToolKind::RoadmapGenerator => "roadmap generator",
            ToolKind::MockInterview => "mock interview",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tool kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny,
}

/// Pure decision: deny only when not entitled and usage has reached the limit.
pub fn decide(usage: i64, entitled: bool, limit: i64) -> QuotaDecision {
    if entitled || usage < limit {
        QuotaDecision::Allow
    } else {
        QuotaDecision::Deny
    }
}

/// Reads usage and decides. Entitled callers skip the count query.
pub async fn check(
    store: &dyn Store,
    user: &AuthUser,
    tool: ToolKind,
    limit: i64,
) -> Result<QuotaDecision, AppError> {
    if user.entitled() {
        return Ok(QuotaDecision::Allow);
    }
    let usage = store.count_usage(&user.user_id, tool).await?;
    Ok(decide(usage, false, limit))
}

/// Rejects with `UpgradeRequired` when the gate denies.
pub async fn enforce(
    store: &dyn Store,
    user: &AuthUser,
    tool: ToolKind,
    limit: i64,
) -> Result<(), AppError> {
    match check(store, user, tool, limit).await? {
        QuotaDecision::Allow => Ok(()),
        QuotaDecision::Deny => {
            info!("Quota reached for user {} on {}", user.user_id, tool);
            Err(AppError::UpgradeRequired { tool, limit })
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsage {
    pub tool: ToolKind,
    pub used: i64,
    /// `None` when the caller is entitled.
    pub remaining: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub plan: Plan,
    pub limit: i64,
    pub tools: Vec<ToolUsage>,
}

pub async fn usage_summary(
    store: &dyn Store,
    user: &AuthUser,
    limit: i64,
) -> Result<UsageSummary, AppError> {
    let mut tools = Vec::with_capacity(ToolKind::ALL.len());
    for tool in ToolKind::ALL {
        let used = store.count_usage(&user.user_id, tool).await?;
        tools.push(ToolUsage {
            tool,
            used,
            remaining: (!user.entitled()).then(|| (limit - used).max(0)),
        });
    }
    Ok(UsageSummary {
        plan: user.plan,
        limit,
        tools,
    })
}
