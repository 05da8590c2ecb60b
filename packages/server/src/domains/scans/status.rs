//! Scan lifecycle states and the allowed transitions between them.
//!
//! ```text
//! pending ──► crawling ──► completed ◄──► analyzing
//!    │           │                           │
//!    └───────────┴──────────► failed ◄───────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Row created, crawl not started yet
    Pending,
    /// Crawl job running
    Crawling,
    /// AI content analysis running
    Analyzing,
    /// Crawl (or analysis) finished
    Completed,
    /// Gave up; `scans.error` holds the reason
    Failed,
}

impl ScanStatus {
    pub const ALL: [ScanStatus; 5] = [
        Self::Pending,
        Self::Crawling,
        Self::Analyzing,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Percent complete shown in progress bars.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Pending => 10,
            Self::Crawling => 40,
            Self::Analyzing => 80,
            Self::Completed => 100,
            Self::Failed => 0,
        }
    }

    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Crawling)
                | (Self::Pending, Self::Failed)
                | (Self::Crawling, Self::Completed)
                | (Self::Crawling, Self::Failed)
                | (Self::Completed, Self::Analyzing)
                | (Self::Analyzing, Self::Completed)
                | (Self::Analyzing, Self::Failed)
        )
    }

    /// States from which `next` may be entered.
    pub fn allowed_predecessors(next: ScanStatus) -> Vec<ScanStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "crawling" => Ok(Self::Crawling),
            "analyzing" => Ok(Self::Analyzing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid scan status: {s}")),
        }
    }
}

// ============================================================================
// sqlx: stored as lowercase TEXT
// ============================================================================

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

impl Type<Postgres> for ScanStatus {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl PgHasArrayType for ScanStatus {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

impl Encode<'_, Postgres> for ScanStatus {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl Decode<'_, Postgres> for ScanStatus {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        raw.parse::<ScanStatus>().map_err(Into::into)
    }
}
