//! Repository and narrative-generation seams (§6.4, §1 "Deliberately
//! OUT of scope"). The core depends on these traits; it never
//! implements them — persistence and LLM prompting are external
//! collaborators.

use async_trait::async_trait;
use chrono::Duration;

use crate::alert::CanonicalAlert;
use crate::intel::{AggregatedIntel, IocType};
use crate::triage::TriageResult;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn upsert(&self, alert: &CanonicalAlert) -> RepoResult<()>;
    async fn find_by_id(&self, alert_id: &str) -> RepoResult<Option<CanonicalAlert>>;
}

#[async_trait]
pub trait TriageRepository: Send + Sync {
    async fn save(&self, result: &TriageResult) -> RepoResult<()>;
    async fn find_by_alert_id(&self, alert_id: &str) -> RepoResult<Option<TriageResult>>;
}

#[async_trait]
pub trait ThreatIntelRepository: Send + Sync {
    async fn upsert_by_ioc(&self, intel: &AggregatedIntel) -> RepoResult<()>;
    async fn find_by_ioc(&self, ioc: &str, ioc_type: IocType) -> RepoResult<Option<AggregatedIntel>>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Count of similar past alerts sharing `fingerprint` within
    /// `window` — feeds the §4.5 historical multiplier.
    async fn similar(&self, fingerprint: &str, window: Duration) -> RepoResult<u32>;
}

/// Narrative-generation seam (§1 "LLM prompt construction ... delegated").
/// The core only needs a human-readable summary of the triage decision;
/// prompt engineering and the vendor HTTP client live outside the core.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn summarize(&self, alert: &CanonicalAlert, intel: &[AggregatedIntel]) -> RepoResult<String>;
}
