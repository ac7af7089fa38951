//! Global configuration tables: oracle heartbeats and the swap-router
//! allow-list.
//!
//! These are the only pieces of cross-order state. They are injected
//! into the engine by reference rather than living in process-wide
//! singletons, and writes require the operator identity.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::EngineError;
use crate::types::{AccountId, FeedId};

/// Default oracle heartbeat: 4 hours.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 4 * 60 * 60;

/// Injected cross-order configuration.
///
/// Reads are free; writes are gated on the operator. Callers that share
/// one instance across threads should wrap it in the usual
/// privileged-write/many-reader discipline (e.g. `RwLock`) — the tables
/// themselves change rarely.
#[derive(Clone, Debug)]
pub struct GlobalConfig {
    operator: AccountId,
    default_heartbeat_secs: u64,
    heartbeats: FxHashMap<FeedId, u64>,
    allowed_routers: FxHashSet<AccountId>,
}

impl GlobalConfig {
    /// Create a config owned by `operator` with the default 4-hour
    /// heartbeat for every feed.
    pub fn new(operator: AccountId) -> Self {
        Self {
            operator,
            default_heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
            heartbeats: FxHashMap::default(),
            allowed_routers: FxHashSet::default(),
        }
    }

    /// The privileged identity allowed to write these tables.
    pub fn operator(&self) -> AccountId {
        self.operator
    }

    /// Heartbeat for a feed: per-feed override or the default.
    pub fn heartbeat_secs(&self, feed: FeedId) -> u64 {
        self.heartbeats
            .get(&feed)
            .copied()
            .unwrap_or(self.default_heartbeat_secs)
    }

    /// Set a per-feed staleness heartbeat. Operator only.
    pub fn set_heartbeat(
        &mut self,
        caller: AccountId,
        feed: FeedId,
        secs: u64,
    ) -> Result<(), EngineError> {
        self.require_operator(caller)?;
        self.heartbeats.insert(feed, secs);
        Ok(())
    }

    /// Change the default heartbeat applied to feeds without an
    /// override. Operator only.
    pub fn set_default_heartbeat(
        &mut self,
        caller: AccountId,
        secs: u64,
    ) -> Result<(), EngineError> {
        self.require_operator(caller)?;
        self.default_heartbeat_secs = secs;
        Ok(())
    }

    /// Whether a swap router may be handed a settlement plan.
    pub fn is_router_allowed(&self, router: AccountId) -> bool {
        self.allowed_routers.contains(&router)
    }

    /// Add a router to the allow-list. Operator only.
    pub fn allow_router(&mut self, caller: AccountId, router: AccountId) -> Result<(), EngineError> {
        self.require_operator(caller)?;
        self.allowed_routers.insert(router);
        Ok(())
    }

    /// Remove a router from the allow-list. Operator only.
    pub fn revoke_router(
        &mut self,
        caller: AccountId,
        router: AccountId,
    ) -> Result<(), EngineError> {
        self.require_operator(caller)?;
        self.allowed_routers.remove(&router);
        Ok(())
    }

    fn require_operator(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller == self.operator {
            Ok(())
        } else {
            Err(EngineError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATOR: AccountId = AccountId(1);
    const STRANGER: AccountId = AccountId(99);

    #[test]
    fn default_heartbeat_applies() {
        let config = GlobalConfig::new(OPERATOR);
        assert_eq!(config.heartbeat_secs(FeedId(5)), DEFAULT_HEARTBEAT_SECS);
    }

    #[test]
    fn per_feed_override() {
        let mut config = GlobalConfig::new(OPERATOR);
        config.set_heartbeat(OPERATOR, FeedId(5), 600).unwrap();
        assert_eq!(config.heartbeat_secs(FeedId(5)), 600);
        assert_eq!(config.heartbeat_secs(FeedId(6)), DEFAULT_HEARTBEAT_SECS);
    }

    #[test]
    fn writes_require_operator() {
        let mut config = GlobalConfig::new(OPERATOR);
        assert_eq!(
            config.set_heartbeat(STRANGER, FeedId(5), 600),
            Err(EngineError::Unauthorized)
        );
        assert_eq!(
            config.allow_router(STRANGER, AccountId(7)),
            Err(EngineError::Unauthorized)
        );
        assert_eq!(
            config.set_default_heartbeat(STRANGER, 10),
            Err(EngineError::Unauthorized)
        );
    }

    #[test]
    fn router_allow_list() {
        let mut config = GlobalConfig::new(OPERATOR);
        let router = AccountId(7);
        assert!(!config.is_router_allowed(router));

        config.allow_router(OPERATOR, router).unwrap();
        assert!(config.is_router_allowed(router));

        config.revoke_router(OPERATOR, router).unwrap();
        assert!(!config.is_router_allowed(router));
    }
}
