//! Loan and reservation workflow
//!
//! A submission is validated, gated and then sent as exactly one transaction
//! call. The server owns the resulting book status; on success the cached book
//! is only marked stale, never advanced locally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::{
    api::loans::TransactionApi,
    error::AppResult,
    models::{Book, LoanForm, LoanId, Member, ReservationForm, ReservationId},
};

use super::{
    catalog::CatalogService,
    events::{EntityEvent, EventBus},
    gate::{CapabilityGate, LOAN_ISSUERS},
    session::SessionStore,
};

pub struct TransactionCoordinator {
    session: Arc<SessionStore>,
    api: Arc<dyn TransactionApi>,
    catalog: Arc<CatalogService>,
    events: EventBus,
}

impl TransactionCoordinator {
    pub fn new(
        session: Arc<SessionStore>,
        api: Arc<dyn TransactionApi>,
        catalog: Arc<CatalogService>,
        events: EventBus,
    ) -> Self {
        Self {
            session,
            api,
            catalog,
            events,
        }
    }

    /// Books and members for the selection lists, fetched concurrently
    pub async fn prepare(&self) -> AppResult<(Vec<Book>, Vec<Member>)> {
        CapabilityGate::require_authenticated(&self.session.current(), "Loans and reservations")?;
        tokio::try_join!(self.catalog.list_books(), self.catalog.list_members())
    }

    /// Create a loan. The form is left as it was, whatever the outcome.
    pub async fn submit_loan(&self, form: &LoanForm) -> AppResult<LoanId> {
        let transaction = form.to_transaction(today())?;
        CapabilityGate::require(&self.session.current(), LOAN_ISSUERS, "Creating a loan")?;

        tracing::debug!(
            "Submitting loan of {} to {}",
            transaction.book_name,
            transaction.member_name
        );
        let loan_id = self.api.create_loan(&transaction).await?;
        tracing::info!("Loan {} created for book {}", loan_id, transaction.book_name);

        self.catalog.invalidate_book(&transaction.book_name).await;
        self.events.publish(EntityEvent::LoanCreated {
            loan_id: loan_id.clone(),
            book_id: transaction.book_name,
            member_id: transaction.member_name,
        });
        Ok(loan_id)
    }

    /// Create a reservation; any logged-in user may reserve
    pub async fn submit_reservation(&self, form: &ReservationForm) -> AppResult<ReservationId> {
        let transaction = form.to_transaction(today())?;
        CapabilityGate::require_authenticated(&self.session.current(), "Reserving a book")?;

        let reservation_id = self.api.create_reservation(&transaction).await?;
        tracing::info!(
            "Reservation {} created for book {}",
            reservation_id,
            transaction.book_name
        );

        self.catalog.invalidate_book(&transaction.book_name).await;
        self.events.publish(EntityEvent::ReservationCreated {
            reservation_id: reservation_id.clone(),
            book_id: transaction.book_name,
            member_id: transaction.member_name,
        });
        Ok(reservation_id)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Keeps a submit control disabled while its request is in flight.
///
/// The coordinator itself never deduplicates; callers that want one request
/// per click hold a [`SubmitPermit`] for the duration of the call.
#[derive(Debug, Default)]
pub struct SubmitLatch {
    busy: AtomicBool,
}

impl SubmitLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SubmitPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitPermit { latch: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the latch on drop
#[derive(Debug)]
pub struct SubmitPermit<'a> {
    latch: &'a SubmitLatch,
}

impl Drop for SubmitPermit<'_> {
    fn drop(&mut self) {
        self.latch.busy.store(false, Ordering::Release);
    }
}
