//! Loan and reservation workflow over real HTTP

use std::sync::atomic::Ordering;

use library_client::{
    models::{BookStatus, LoanForm, ReservationForm},
    AppError, AppState,
};

use crate::support::{client_state, spawn_backend, DUNE, HOBBIT};

async fn logged_in(base_url: &str, dir: &std::path::Path, user: &str, pw: &str) -> AppState {
    let state = client_state(base_url, dir);
    state.services.session.bootstrap().await;
    state.services.session.login(user, pw).await.unwrap();
    state
}

#[tokio::test]
async fn test_prepare_lists_books_and_members() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "member_bob", "bob-pw").await;

    let (books, members) = state.services.transactions.prepare().await.unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b.status == BookStatus::Available));
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].title.as_deref(), Some("Bob Baker"));
}

#[tokio::test]
async fn test_librarian_loan_updates_status_from_server() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "librarian_jane", "jane-pw").await;
    let services = &state.services;

    services.transactions.prepare().await.unwrap();
    let mut rx = services.events.subscribe();

    let form = LoanForm::new(HOBBIT, "M-001", "2099-01-15");
    let loan_id = services.transactions.submit_loan(&form).await.unwrap();
    assert!(loan_id.0.starts_with("LOAN-"));
    assert_eq!(backend.loan_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.book_status(HOBBIT), "On Loan");

    let event = rx.recv().await.unwrap();
    assert_eq!(event.affected_book(), Some(HOBBIT));

    let book = services.catalog.book(HOBBIT).await.unwrap();
    assert_eq!(book.status, BookStatus::OnLoan);
    assert_eq!(book.current_borrower.as_deref(), Some("M-001"));
    // Untouched books keep their cached snapshot
    assert!(!services.catalog.cache().is_stale(DUNE).await);
}

#[tokio::test]
async fn test_unavailable_book_is_rejected_by_server() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "Administrator", "admin-pw").await;
    let transactions = &state.services.transactions;

    let form = LoanForm::new(DUNE, "M-001", "2099-01-15");
    transactions.submit_loan(&form).await.unwrap();

    let err = transactions.submit_loan(&form).await.unwrap_err();
    match &err {
        AppError::Transaction(reason) => {
            assert_eq!(reason, &format!("Book {} is not available", DUNE))
        }
        other => panic!("expected transaction error, got {:?}", other),
    }
    assert!(err.user_message().starts_with("That didn't work"));
    assert_eq!(backend.loan_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_member_loan_never_reaches_server() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "member_bob", "bob-pw").await;

    let form = LoanForm::new(HOBBIT, "M-001", "2099-01-15");
    let err = state.services.transactions.submit_loan(&form).await.unwrap_err();
    assert!(matches!(err, AppError::Permission(_)));
    assert!(err.user_message().starts_with("You are not allowed"));
    assert_eq!(backend.loan_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.book_status(HOBBIT), "Available");
}

#[tokio::test]
async fn test_invalid_form_never_reaches_server() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "librarian_jane", "jane-pw").await;
    let transactions = &state.services.transactions;

    for form in [
        LoanForm::new(HOBBIT, "M-001", ""),
        LoanForm::new("", "M-001", "2099-01-15"),
        LoanForm::new(HOBBIT, "M-001", "15/01/2099"),
    ] {
        let err = transactions.submit_loan(&form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", form);
        assert!(err.user_message().starts_with("Please fix your input"));
    }
    assert_eq!(backend.loan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_member_reserves_book() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "member_bob", "bob-pw").await;
    let services = &state.services;

    services.catalog.list_books().await.unwrap();
    let form = ReservationForm::new(DUNE, "M-001");
    let reservation_id = services.transactions.submit_reservation(&form).await.unwrap();
    assert!(reservation_id.0.starts_with("RES-"));
    assert_eq!(backend.reservation_calls.load(Ordering::SeqCst), 1);

    assert_eq!(
        services.catalog.book_status(DUNE).await.unwrap(),
        BookStatus::Reserved
    );
}

#[tokio::test]
async fn test_logged_out_client_cannot_reserve() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = logged_in(&base_url, dir.path(), "member_bob", "bob-pw").await;
    state.services.session.logout().await.unwrap();

    let form = ReservationForm::new(DUNE, "M-001");
    assert!(matches!(
        state.services.transactions.submit_reservation(&form).await,
        Err(AppError::Permission(_))
    ));
    assert_eq!(backend.reservation_calls.load(Ordering::SeqCst), 0);
}
