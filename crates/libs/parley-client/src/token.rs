use std::sync::atomic::{AtomicU64, Ordering};

use parley_schema::CorrelationToken;

/// Monotonic correlation token source: `<prefix><counter>`.
#[derive(Debug)]
pub struct TokenGenerator {
    prefix: String,
    next: AtomicU64,
}

impl TokenGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self { prefix: prefix.into(), next: AtomicU64::new(first) }
    }

    pub fn next_token(&self) -> CorrelationToken {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        CorrelationToken::new(format!("{}{id}", self.prefix))
    }
}
