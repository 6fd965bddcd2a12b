//! Port abstraction for the kudo upsert protocol.

use async_trait::async_trait;

use crate::domain::{ItemId, Kudo, KudoDraft, KudoId, UpsertOutcome, Username};

use super::PersistenceError;

/// Stores at most one kudo per (item, creator) pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KudoRepository: Send + Sync {
    /// Insert the draft under `candidate_id`, or update the pair's existing
    /// kudo in place, as one atomic write.
    ///
    /// The existing kudo keeps its original id on update.
    async fn upsert(
        &self,
        draft: &KudoDraft,
        candidate_id: KudoId,
    ) -> Result<UpsertOutcome, PersistenceError>;

    /// The kudo `creator` gave `item`, if any.
    async fn find_for(
        &self,
        item_id: &ItemId,
        creator: &Username,
    ) -> Result<Option<Kudo>, PersistenceError>;
}
