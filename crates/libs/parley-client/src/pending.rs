//! Token → pending request bookkeeping.
//!
//! The table is the only shared mutable state of the client. Callers register
//! a completion before their request is written; the read loop claims it when
//! a reply carrying the same token arrives. A request whose caller gave up
//! (timeout or cancellation) leaves a tombstone behind so that a late reply is
//! recognised and discarded instead of being dispatched as a push event.
//! Tombstones are bounded and evicted oldest first.

use std::collections::{HashMap, HashSet, VecDeque};

use parley_schema::{CorrelationToken, JsonValue};

use crate::error::ClientError;
use crate::token::TokenGenerator;

/// Fills a pending request's result slot. Runs outside the table lock.
pub type Completion = Box<dyn FnOnce(Result<JsonValue, ClientError>) + Send>;

pub enum Claim {
    Reply(Completion),
    /// The token belonged to a request whose caller has given up.
    Abandoned,
    Unknown,
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reply(_) => f.write_str("Reply"),
            Self::Abandoned => f.write_str("Abandoned"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

pub struct PendingTable {
    live: HashMap<CorrelationToken, Completion>,
    abandoned: VecDeque<CorrelationToken>,
    abandoned_set: HashSet<CorrelationToken>,
    retention: usize,
    closed: bool,
}

impl PendingTable {
    pub fn new(retention: usize) -> Self {
        Self {
            live: HashMap::new(),
            abandoned: VecDeque::new(),
            abandoned_set: HashSet::new(),
            retention,
            closed: false,
        }
    }

    /// Registers `completion` under a fresh token.
    ///
    /// Tokens still live or tombstoned are skipped, so a new request never
    /// shares a token with one the engine may still answer.
    pub fn register(
        &mut self,
        tokens: &TokenGenerator,
        completion: Completion,
    ) -> Result<CorrelationToken, ClientError> {
        if self.closed {
            return Err(ClientError::ChannelClosed);
        }
        loop {
            let token = tokens.next_token();
            if self.live.contains_key(&token) || self.abandoned_set.contains(&token) {
                log::warn!("pending: token {token} still outstanding, regenerating");
                continue;
            }
            self.live.insert(token.clone(), completion);
            return Ok(token);
        }
    }

    pub fn claim(&mut self, token: &CorrelationToken) -> Claim {
        if let Some(completion) = self.live.remove(token) {
            return Claim::Reply(completion);
        }
        if self.abandoned_set.remove(token) {
            self.abandoned.retain(|kept| kept != token);
            return Claim::Abandoned;
        }
        Claim::Unknown
    }

    /// Drops a live entry and remembers its token. Returns `false` when the
    /// token was not live, e.g. because its reply already arrived.
    pub fn abandon(&mut self, token: &CorrelationToken) -> bool {
        if self.live.remove(token).is_none() {
            return false;
        }
        if self.retention == 0 {
            return true;
        }
        self.abandoned_set.insert(token.clone());
        self.abandoned.push_back(token.clone());
        while self.abandoned.len() > self.retention {
            if let Some(evicted) = self.abandoned.pop_front() {
                self.abandoned_set.remove(&evicted);
                log::trace!("pending: forgetting abandoned token {evicted}");
            }
        }
        true
    }

    /// Closes the table and hands back every live completion.
    pub fn drain(&mut self) -> Vec<Completion> {
        self.closed = true;
        self.abandoned.clear();
        self.abandoned_set.clear();
        self.live.drain().map(|(_, completion)| completion).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn abandoned_len(&self) -> usize {
        self.abandoned.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn recording() -> (Completion, mpsc::Receiver<Result<JsonValue, ClientError>>) {
        let (tx, rx) = mpsc::channel();
        let completion: Completion = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });
        (completion, rx)
    }

    fn noop() -> Completion {
        Box::new(|_| {})
    }

    #[test]
    fn claim_returns_registered_completion() {
        let tokens = TokenGenerator::new("c");
        let mut table = PendingTable::new(8);
        let (completion, rx) = recording();
        let token = table.register(&tokens, completion).expect("register");
        assert_eq!(table.len(), 1);

        let Claim::Reply(completion) = table.claim(&token) else {
            panic!("expected a live entry");
        };
        completion(Ok(JsonValue::Bool(true)));
        assert_eq!(rx.recv().expect("outcome"), Ok(JsonValue::Bool(true)));
        assert!(table.is_empty());
        assert!(matches!(table.claim(&token), Claim::Unknown));
    }

    #[test]
    fn register_skips_outstanding_tokens() {
        let mut table = PendingTable::new(8);
        let first = table.register(&TokenGenerator::starting_at("c", 1), noop()).expect("first");
        let tombstoned = table.register(&TokenGenerator::starting_at("c", 2), noop()).expect("second");
        assert!(table.abandon(&tombstoned));

        let rewound = TokenGenerator::starting_at("c", 1);
        let third = table.register(&rewound, noop()).expect("third");
        assert_ne!(third, first);
        assert_ne!(third, tombstoned);
        assert_eq!(third.as_str(), "c3");
    }

    #[test]
    fn abandoned_token_is_claimed_once() {
        let tokens = TokenGenerator::new("c");
        let mut table = PendingTable::new(8);
        let token = table.register(&tokens, noop()).expect("register");
        assert!(table.abandon(&token));
        assert!(!table.abandon(&token));
        assert!(table.is_empty());
        assert!(matches!(table.claim(&token), Claim::Abandoned));
        assert!(matches!(table.claim(&token), Claim::Unknown));
        assert_eq!(table.abandoned_len(), 0);
    }

    #[test]
    fn tombstones_are_bounded() {
        let tokens = TokenGenerator::new("c");
        let mut table = PendingTable::new(2);
        let abandoned: Vec<_> = (0..3)
            .map(|_| {
                let token = table.register(&tokens, noop()).expect("register");
                table.abandon(&token);
                token
            })
            .collect();
        assert_eq!(table.abandoned_len(), 2);
        assert!(matches!(table.claim(&abandoned[0]), Claim::Unknown));
        assert!(matches!(table.claim(&abandoned[2]), Claim::Abandoned));
    }

    #[test]
    fn drain_closes_the_table() {
        let tokens = TokenGenerator::new("c");
        let mut table = PendingTable::new(8);
        for _ in 0..3 {
            table.register(&tokens, noop()).expect("register");
        }
        assert_eq!(table.drain().len(), 3);
        assert!(table.is_empty());
        assert!(table.is_closed());
        assert_eq!(table.register(&tokens, noop()), Err(ClientError::ChannelClosed));
    }
}
