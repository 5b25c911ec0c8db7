use crate::model::{Reading, Sample};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared slot holding the most recent reading.
///
/// Readers see the zero reading until the first message arrives.
#[derive(Debug, Clone, Default)]
pub struct LatestReading {
    inner: Arc<RwLock<Option<Reading>>>,
}

impl LatestReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Reading {
        self.inner.read().await.unwrap_or_default()
    }

    pub async fn set(&self, reading: Reading) {
        *self.inner.write().await = Some(reading);
    }

    pub async fn has_data(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

/// Bounded in-memory table of recent samples, oldest first
#[derive(Debug, Clone)]
pub struct History {
    inner: Arc<RwLock<VecDeque<Sample>>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity,
        }
    }

    pub async fn push(&self, reading: Reading) {
        if self.capacity == 0 {
            return;
        }
        let mut samples = self.inner.write().await;
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(Sample {
            reading,
            received_at: Utc::now(),
        });
    }

    /// The newest `limit` samples, oldest first
    pub async fn snapshot(&self, limit: usize) -> Vec<Sample> {
        let samples = self.inner.read().await;
        let skip = samples.len().saturating_sub(limit);
        samples.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
