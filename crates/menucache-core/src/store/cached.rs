use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_age;

/// Data with the time it was written, as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        format_age(self.age_minutes())
    }

    pub fn is_stale(&self, max_age_minutes: i64) -> bool {
        self.age_minutes() >= max_age_minutes
    }
}
