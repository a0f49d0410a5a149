//! Process-wide cache of trained listening profiles.
//!
//! Written only by the train operation, read by evaluate and batch
//! promotion. An entry stays until the next train for the same user
//! overwrites it or `invalidate` drops it.

use super::profile::ListeningProfile;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct ProfileCache {
    entries: Mutex<HashMap<i64, Arc<ListeningProfile>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, profile: ListeningProfile) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(profile.user_id, Arc::new(profile));
    }

    pub fn get(&self, user_id: i64) -> Option<Arc<ListeningProfile>> {
        self.entries.lock().unwrap().get(&user_id).cloned()
    }

    pub fn invalidate(&self, user_id: i64) -> bool {
        self.entries.lock().unwrap().remove(&user_id).is_some()
    }
}
