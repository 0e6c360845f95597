use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

/// Ids of jobs already seen with generated skills.
///
/// Owned by the application and handed to every poller it creates, so a job
/// known to be complete is never polled again while the application lives.
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct PopulatedJobs {
    ids: Arc<RwLock<HashSet<Uuid>>>,
}

impl PopulatedJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Returns true if the id was not recorded before.
    pub fn insert(&self, id: Uuid) -> bool {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.ids.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let cache = PopulatedJobs::new();
        let shared = cache.clone();
        let id = Uuid::new_v4();

        assert!(shared.insert(id));
        assert!(!cache.insert(id));
        assert!(cache.contains(id));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(shared.is_empty());
    }
}
