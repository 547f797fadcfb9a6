use crate::game::codec::Square;

/// Generation-tagged guard over the single outstanding oracle solicitation
///
/// Every solicitation is issued a [`Ticket`] carrying the generation current
/// at the time of the request. [`SolicitationGuard::advance`] bumps the
/// generation (new session, game over), turning every outstanding ticket
/// stale so late responses can be recognised and dropped.
#[derive(Debug, Default)]
pub struct SolicitationGuard {
    generation: u64,
    in_flight: Option<PendingCall>,
}

/// What the outstanding solicitation asked the oracle for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingCall {
    Setup,
    Targets { square: Square },
    Submission { from: Square, to: Square },
    EngineMove,
    CheckmatePoll,
}

/// Proof of a granted solicitation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    call: PendingCall,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn call(&self) -> PendingCall {
        self.call
    }
}

impl SolicitationGuard {
    /// Invalidate every outstanding ticket
    pub fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = None;
        self.generation
    }

    /// Invalidate every outstanding ticket and grant a fresh one for `call`
    pub fn restart(&mut self, call: PendingCall) -> Ticket {
        self.advance();
        self.in_flight = Some(call);
        Ticket {
            generation: self.generation,
            call,
        }
    }

    /// Grant a ticket, or `None` while another solicitation is outstanding
    pub fn request(&mut self, call: PendingCall) -> Option<Ticket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.in_flight = Some(call);
        Some(Ticket {
            generation: self.generation,
            call,
        })
    }

    /// Whether `ticket` still matches the outstanding solicitation
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && self.in_flight == Some(ticket.call)
    }

    /// Release the slot held by `ticket`; false if the ticket was stale
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Swap the slot held by `ticket` for a follow-up call in the same generation
    pub fn hand_over(&mut self, ticket: Ticket, next: PendingCall) -> Option<Ticket> {
        if !self.is_current(&ticket) {
            return None;
        }
        self.in_flight = Some(next);
        Some(Ticket {
            generation: self.generation,
            call: next,
        })
    }

    /// Drop the outstanding solicitation without bumping the generation
    pub fn cancel(&mut self) -> Option<PendingCall> {
        self.in_flight.take()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<PendingCall> {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
