use async_trait::async_trait;

use super::types::{Member, ResetRequest};
use crate::error::RemoteError;
use crate::period::ScheduleConfig;

/// The remote source of truth for member status.
///
/// Mutating calls act on behalf of the authenticated member; the identity
/// is implicit in the implementation (bearer token, or the acting uid of
/// an in-memory store).
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn fetch_members(&self) -> Result<Vec<Member>, RemoteError>;

    async fn fetch_schedule(&self) -> Result<ScheduleConfig, RemoteError>;

    /// Clear `has_eaten` for everyone; when `increment_missed`, bump the
    /// missed count of every member who is neither away nor fed.
    async fn reset_eaten(&self, request: &ResetRequest) -> Result<(), RemoteError>;

    async fn mark_eaten(&self) -> Result<(), RemoteError>;

    async fn toggle_away(&self) -> Result<(), RemoteError>;

    async fn report_food_finished(&self) -> Result<(), RemoteError>;

    async fn undo_food_finished(&self) -> Result<(), RemoteError>;
}
