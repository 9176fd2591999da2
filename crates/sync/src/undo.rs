//! Single-step undo offers.
//!
//! An undoable write hands back an [`UndoOffer`] for the record it
//! touched. The offer is the only handle through which the compensating
//! call can be issued from the sync layer, and it is valid once: using it,
//! or making another undoable write to the same record, retires it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use iems_core::attendance::AttendanceKey;
use iems_core::types::{ClassId, Phone};
use iems_remote::{RemoteDataPort, RemoteResult};

use crate::key::Entity;

/// The record an undo restores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UndoTarget {
    Profile { phone: Phone },
    Attendance(AttendanceKey),
    Homework { class_id: ClassId },
    Fee { phone: Phone },
}

impl UndoTarget {
    pub fn entity(&self) -> Entity {
        match self {
            Self::Profile { .. } => Entity::Profile,
            Self::Attendance(_) => Entity::Attendance,
            Self::Homework { .. } => Entity::Homework,
            Self::Fee { .. } => Entity::Fee,
        }
    }

    /// Issue the compensating call.
    pub(crate) async fn run(&self, port: &dyn RemoteDataPort) -> RemoteResult<()> {
        match self {
            Self::Profile { phone } => port.undo_profile(phone).await,
            Self::Attendance(key) => {
                port.undo_attendance(&key.class_id, &key.student_phone)
                    .await
            }
            Self::Homework { class_id } => port.undo_homework(class_id).await,
            Self::Fee { phone } => port.undo_fee(phone).await,
        }
    }
}

/// Permission to undo the most recent write to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOffer {
    target: UndoTarget,
    generation: u64,
}

impl UndoOffer {
    pub fn target(&self) -> &UndoTarget {
        &self.target
    }
}

/// Live offers, at most one per target.
#[derive(Clone, Default)]
pub(crate) struct UndoRegistry {
    next: Arc<AtomicU64>,
    live: Arc<Mutex<HashMap<UndoTarget, u64>>>,
}

impl UndoRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<UndoTarget, u64>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a new offer for `target`, retiring any earlier one.
    pub fn offer(&self, target: UndoTarget) -> UndoOffer {
        let generation = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(target.clone(), generation);
        UndoOffer { target, generation }
    }

    pub fn is_live(&self, offer: &UndoOffer) -> bool {
        self.lock().get(&offer.target) == Some(&offer.generation)
    }

    /// Consume `offer` if it is still live.
    pub fn take(&self, offer: &UndoOffer) -> bool {
        let mut live = self.lock();
        if live.get(&offer.target) == Some(&offer.generation) {
            live.remove(&offer.target);
            true
        } else {
            false
        }
    }

    /// Put back an offer whose undo call failed, unless a newer write has
    /// claimed the target since.
    pub fn restore(&self, offer: &UndoOffer) {
        self.lock()
            .entry(offer.target.clone())
            .or_insert(offer.generation);
    }

    /// Retire whatever offer exists for `target`.
    pub fn retire(&self, target: &UndoTarget) {
        self.lock().remove(target);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee(phone: &str) -> UndoTarget {
        UndoTarget::Fee {
            phone: phone.to_string(),
        }
    }

    #[test]
    fn offer_is_single_use() {
        let registry = UndoRegistry::default();
        let offer = registry.offer(fee("555"));
        assert!(registry.take(&offer));
        assert!(!registry.take(&offer));
    }

    #[test]
    fn newer_offer_replaces_older_for_same_target() {
        let registry = UndoRegistry::default();
        let first = registry.offer(fee("555"));
        let second = registry.offer(fee("555"));
        let other = registry.offer(fee("777"));

        assert!(!registry.is_live(&first));
        assert!(registry.is_live(&second));
        assert!(registry.is_live(&other));
    }

    #[test]
    fn restore_does_not_override_newer_offer() {
        let registry = UndoRegistry::default();
        let first = registry.offer(fee("555"));
        assert!(registry.take(&first));
        let second = registry.offer(fee("555"));

        registry.restore(&first);
        assert!(registry.is_live(&second));
        assert!(!registry.is_live(&first));
    }

    #[test]
    fn clear_retires_everything() {
        let registry = UndoRegistry::default();
        let offer = registry.offer(UndoTarget::Homework {
            class_id: "c1".into(),
        });
        registry.clear();
        assert!(!registry.is_live(&offer));
        assert_eq!(offer.target().entity(), Entity::Homework);
    }
}
