//! Entity change notifications
//!
//! Mutators publish what changed; list views subscribe and re-fetch.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::models::{LoanId, ReservationId};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    BookChanged { book_id: String },
    BookDeleted { book_id: String },
    MemberChanged { member_id: String },
    MemberDeleted { member_id: String },
    LoanCreated { loan_id: LoanId, book_id: String, member_id: String },
    ReservationCreated { reservation_id: ReservationId, book_id: String, member_id: String },
}

impl EntityEvent {
    /// Book whose displayed status may be stale after this event
    pub fn affected_book(&self) -> Option<&str> {
        match self {
            EntityEvent::BookChanged { book_id }
            | EntityEvent::BookDeleted { book_id }
            | EntityEvent::LoanCreated { book_id, .. }
            | EntityEvent::ReservationCreated { book_id, .. } => Some(book_id),
            EntityEvent::MemberChanged { .. } | EntityEvent::MemberDeleted { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EntityEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: EntityEvent) {
        tracing::debug!("Publishing {:?}", event);
        // An error only means nobody is listening right now
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.sender.subscribe()
    }

    /// Subscription as a stream; lagged receivers yield an error item
    pub fn stream(&self) -> BroadcastStream<EntityEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
