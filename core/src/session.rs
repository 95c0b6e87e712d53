//! Cache for the signed-in user's profile.
//!
//! Two states: FRESH (a user is cached and its `exp` is still ahead of the
//! clock) and STALE/EMPTY. `Gateway::current_user` only goes to the network
//! in the second state.

use std::sync::Arc;

use crate::clock::Clock;
use crate::types::UserInfo;

pub struct UserCache {
    clock: Arc<dyn Clock>,
    cached: Option<UserInfo>,
}

impl UserCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            cached: None,
        }
    }

    /// The cached user while `exp * 1000 > now`.
    pub fn fresh(&self) -> Option<&UserInfo> {
        let now = self.clock.now_millis();
        self.cached
            .as_ref()
            .filter(|user| user.exp.saturating_mul(1000) > now)
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    pub fn store(&mut self, user: UserInfo) {
        self.cached = Some(user);
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }
}
