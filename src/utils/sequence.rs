//! Monotonic request sequencing for overlapping fetches.
//!
//! Every fetch takes a [`Ticket`] before it is issued. When the response
//! arrives, [`Sequencer::accept`] admits it only if no newer response has
//! already been applied, so a slow stale snapshot can never overwrite a
//! fresher one.

/// Identifies one issued fetch. Ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Sequencer {
    next: u64,
    last_applied: Option<u64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the ticket for a fetch that is about to be issued.
    pub fn issue(&mut self) -> Ticket {
        self.next += 1;
        Ticket(self.next)
    }

    /// Admit a response for reconciliation.
    ///
    /// Returns `false` when a response with a newer ticket was already
    /// applied; the caller must drop the stale payload.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        match self.last_applied {
            Some(last) if ticket.0 <= last => false,
            _ => {
                self.last_applied = Some(ticket.0);
                true
            }
        }
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }
}
