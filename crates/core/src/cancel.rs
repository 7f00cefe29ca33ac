//! Cancellation tokens for dispatched fetches.
//!
//! Every fetch the dispatcher starts gets a [`FetchTicket`]: a shared
//! cancellation flag plus the generation number of the dispatch that created
//! it. A completion is applied only if its ticket is still current.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cancellation token shared between the dispatcher and one fetch task.
///
/// Cloning shares the flag: cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Token and generation attached to one dispatched fetch.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Issues tickets and remembers which one is current.
#[derive(Debug, Default)]
pub struct TicketIssuer {
    generation: u64,
    current: Option<CancellationToken>,
}

impl TicketIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the outstanding ticket (if any) and issue a fresh one.
    pub fn issue(&mut self) -> FetchTicket {
        self.cancel_current();
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        FetchTicket { generation: self.generation, token }
    }

    /// Cancel the outstanding ticket without issuing a new one.
    ///
    /// Bumps the generation so a completion that raced the cancel is still
    /// recognised as stale.
    pub fn cancel_current(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
            self.generation += 1;
        }
    }

    /// Whether a completion carrying `ticket` may mutate shared state.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        !ticket.token.is_cancelled() && ticket.generation == self.generation
    }

    /// Mark the current ticket as finished so it is not cancelled later.
    pub fn settle(&mut self, ticket: &FetchTicket) {
        if self.is_current(ticket) {
            self.current = None;
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_outstanding(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_clone_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut issuer = TicketIssuer::new();
        let first = issuer.issue();
        let second = issuer.issue();

        assert!(first.token.is_cancelled());
        assert!(!issuer.is_current(&first));
        assert!(issuer.is_current(&second));
    }

    #[test]
    fn test_cancel_current_invalidates_ticket() {
        let mut issuer = TicketIssuer::new();
        let ticket = issuer.issue();
        issuer.cancel_current();

        assert!(!issuer.is_current(&ticket));
        assert!(!issuer.has_outstanding());
    }

    #[test]
    fn test_settled_ticket_is_not_cancelled_by_next_issue() {
        let mut issuer = TicketIssuer::new();
        let ticket = issuer.issue();
        issuer.settle(&ticket);
        let _next = issuer.issue();

        assert!(!ticket.token.is_cancelled());
        assert!(!issuer.is_current(&ticket));
    }
}
