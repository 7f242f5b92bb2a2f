//! Team membership and radio messaging.
//!
//! A team is an aggregate owned by the battle. Tanks hold only a weak handle
//! to their team's [`TeamChannel`], so dropping a team never keeps its tanks'
//! state alive and a tank whose team is gone simply behaves as teamless.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use treadwar_core::tank::TankId;
//! use treadwar_core::team::{Team, TeamChannel};
//!
//! let team = Arc::new(Team::new("red"));
//! team.join(TankId::new(1));
//! team.join(TankId::new(2));
//!
//! team.broadcast(TankId::new(1), serde_json::json!({ "target": 5 }));
//!
//! let inbox = team.messages(TankId::new(2));
//! assert_eq!(inbox.len(), 1);
//! assert!(team.messages(TankId::new(1)).is_empty());
//! ```

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tank::TankId;

/// A message sent over the team radio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioMessage {
    /// Tank that sent the message.
    pub from: TankId,
    /// Opaque payload chosen by the sender's AI.
    pub payload: Value,
}

/// Capability a tank needs from its team.
///
/// `messages` pulls the inbox for one tank; implementations decide whether
/// pulling drains it. The reference [`Team`] drains.
pub trait TeamChannel: Send + Sync {
    /// Name of the team, used for ally identification.
    fn name(&self) -> &str;

    /// Messages waiting for `tank`. Empty when there are none.
    fn messages(&self, tank: TankId) -> Vec<RadioMessage>;
}

/// `true` when both team names are present and equal.
///
/// Teamless tanks are never allies, not even of each other.
#[must_use]
pub fn are_allies(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Reference team: a named member list with per-tank inboxes.
#[derive(Debug)]
pub struct Team {
    name: String,
    inboxes: Mutex<BTreeMap<TankId, Vec<RadioMessage>>>,
}

impl Team {
    /// Creates an empty team.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inboxes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registers a member with an empty inbox. Joining twice is harmless.
    pub fn join(&self, tank: TankId) {
        self.lock().entry(tank).or_default();
    }

    /// Returns member ids in ascending order.
    #[must_use]
    pub fn members(&self) -> Vec<TankId> {
        self.lock().keys().copied().collect()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Delivers `payload` to every member except `from`.
    pub fn broadcast(&self, from: TankId, payload: Value) {
        let mut inboxes = self.lock();
        for (member, inbox) in inboxes.iter_mut() {
            if *member != from {
                inbox.push(RadioMessage {
                    from,
                    payload: payload.clone(),
                });
            }
        }
    }

    // A panic while holding the lock leaves plain data behind; keep using it.
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<TankId, Vec<RadioMessage>>> {
        self.inboxes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TeamChannel for Team {
    fn name(&self) -> &str {
        &self.name
    }

    fn messages(&self, tank: TankId) -> Vec<RadioMessage> {
        self.lock()
            .get_mut(&tank)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
