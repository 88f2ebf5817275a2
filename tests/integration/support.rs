//! In-process fake of the library backend
//!
//! Serves the identity, resource and transaction endpoints the client uses,
//! with just enough state to check session cookies and book status changes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;

use library_client::{
    config::{ApiConfig, AppConfig, SessionConfig},
    AppState,
};

pub const HOBBIT: &str = "978-0261103573";
pub const DUNE: &str = "978-0441013593";

#[derive(Default)]
pub struct Backend {
    passwords: HashMap<String, String>,
    sessions: Mutex<HashMap<String, String>>,
    books: Mutex<BTreeMap<String, Value>>,
    members: Vec<Value>,
    next_id: AtomicUsize,
    pub loan_calls: AtomicUsize,
    pub reservation_calls: AtomicUsize,
    pub probe_fails: AtomicBool,
    pub logout_fails: AtomicBool,
    /// When set, logout requests wait for this before answering
    pub logout_gate: Mutex<Option<Arc<Notify>>>,
    /// Signalled when a gated logout request has arrived
    pub logout_started: Notify,
}

impl Backend {
    fn seeded() -> Self {
        let passwords = [
            ("librarian_jane", "jane-pw"),
            ("member_bob", "bob-pw"),
            ("Administrator", "admin-pw"),
        ]
        .into_iter()
        .map(|(user, pw)| (user.to_string(), pw.to_string()))
        .collect();

        let books = [(HOBBIT, "The Hobbit", "J.R.R. Tolkien"), (DUNE, "Dune", "Frank Herbert")]
            .into_iter()
            .map(|(isbn, title, author)| {
                (
                    isbn.to_string(),
                    json!({
                        "name": isbn,
                        "title": title,
                        "author": author,
                        "isbn": isbn,
                        "status": "Available",
                    }),
                )
            })
            .collect();

        Self {
            passwords,
            books: Mutex::new(books),
            members: vec![
                json!({"name": "M-001", "title": "Bob Baker", "membership_id": "M-001", "email": "bob@example.com"}),
                json!({"name": "M-002", "title": "Ada Lane", "membership_id": "M-002"}),
            ],
            ..Self::default()
        }
    }

    pub fn book_status(&self, isbn: &str) -> String {
        self.books.lock().unwrap()[isbn]["status"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<String> {
        let sid = sid_from(headers)?;
        self.sessions.lock().unwrap().get(&sid).cloned()
    }

    fn next_name(&self, prefix: &str) -> String {
        format!("{}-{:04}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

type Shared = Arc<Backend>;

fn sid_from(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "sid")
        .map(|(_, value)| value.to_string())
}

fn not_permitted() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"exception": "frappe.exceptions.PermissionError: Not permitted"})),
    )
        .into_response()
}

fn not_available(isbn: &str) -> Response {
    (
        StatusCode::EXPECTATION_FAILED,
        Json(json!({
            "exception": format!("frappe.exceptions.ValidationError: Book {} is not available", isbn)
        })),
    )
        .into_response()
}

async fn current_identity(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if backend.probe_fails.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let user = backend.user_for(&headers).unwrap_or_else(|| "Guest".to_string());
    Json(json!({ "message": user })).into_response()
}

#[derive(Deserialize)]
struct Credentials {
    usr: String,
    pwd: String,
}

async fn login(State(backend): State<Shared>, Json(credentials): Json<Credentials>) -> Response {
    if backend.passwords.get(&credentials.usr) != Some(&credentials.pwd) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid login credentials"})),
        )
            .into_response();
    }

    let sid = backend.next_name("sid");
    backend
        .sessions
        .lock()
        .unwrap()
        .insert(sid.clone(), credentials.usr.clone());
    (
        [(header::SET_COOKIE, format!("sid={}; Path=/; HttpOnly", sid))],
        Json(json!({"message": "Logged In", "full_name": credentials.usr})),
    )
        .into_response()
}

async fn logout(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let gate = backend.logout_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        backend.logout_started.notify_one();
        gate.notified().await;
    }

    if backend.logout_fails.load(Ordering::SeqCst) {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    if let Some(sid) = sid_from(&headers) {
        backend.sessions.lock().unwrap().remove(&sid);
    }
    Json(json!({})).into_response()
}

async fn list_books(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if backend.user_for(&headers).is_none() {
        return not_permitted();
    }
    let books: Vec<Value> = backend.books.lock().unwrap().values().cloned().collect();
    Json(json!({ "data": books })).into_response()
}

async fn get_book(
    State(backend): State<Shared>,
    UrlPath(isbn): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    if backend.user_for(&headers).is_none() {
        return not_permitted();
    }
    match backend.books.lock().unwrap().get(&isbn) {
        Some(book) => Json(json!({ "data": book })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"exception": "frappe.exceptions.DoesNotExistError: Book not found"})),
        )
            .into_response(),
    }
}

async fn list_members(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if backend.user_for(&headers).is_none() {
        return not_permitted();
    }
    Json(json!({ "data": backend.members })).into_response()
}

#[derive(Deserialize)]
struct LoanBody {
    book_name: String,
    member_name: String,
    #[allow(dead_code)]
    loan_date: String,
    #[allow(dead_code)]
    return_date: String,
}

async fn create_loan(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LoanBody>,
) -> Response {
    backend.loan_calls.fetch_add(1, Ordering::SeqCst);
    if backend.user_for(&headers).is_none() {
        return not_permitted();
    }

    let mut books = backend.books.lock().unwrap();
    let Some(book) = books.get_mut(&body.book_name) else {
        return not_available(&body.book_name);
    };
    if book["status"] != "Available" {
        return not_available(&body.book_name);
    }
    book["status"] = json!("On Loan");
    book["current_borrower"] = json!(body.member_name);

    Json(json!({"message": {"loan_name": backend.next_name("LOAN")}})).into_response()
}

#[derive(Deserialize)]
struct ReservationBody {
    book_name: String,
    member_name: String,
    #[allow(dead_code)]
    reservation_date: String,
}

async fn create_reservation(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ReservationBody>,
) -> Response {
    backend.reservation_calls.fetch_add(1, Ordering::SeqCst);
    if backend.user_for(&headers).is_none() {
        return not_permitted();
    }

    let mut books = backend.books.lock().unwrap();
    let Some(book) = books.get_mut(&body.book_name) else {
        return not_available(&body.book_name);
    };
    if book["status"] == "Reserved" {
        return not_available(&body.book_name);
    }
    book["status"] = json!("Reserved");
    book["current_reservation"] = json!(body.member_name);

    Json(json!({"reservation_name": backend.next_name("RES")})).into_response()
}

/// Start the fake backend on an ephemeral port; returns its API base URL
pub async fn spawn_backend() -> (String, Shared) {
    let backend = Arc::new(Backend::seeded());

    let app = Router::new()
        .route("/api/method/get-current-identity", get(current_identity))
        .route("/api/method/login", post(login))
        .route("/api/method/logout", post(logout))
        .route("/api/method/create-loan-transaction", post(create_loan))
        .route("/api/method/create-reservation-transaction", post(create_reservation))
        .route("/api/resource/Book", get(list_books))
        .route("/api/resource/Book/:id", get(get_book))
        .route("/api/resource/Member", get(list_members))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake backend");
    let addr = listener.local_addr().expect("Fake backend has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake backend stopped");
    });

    (format!("http://{}/api", addr), backend)
}

/// A fresh client process pointed at `base_url`, keeping its hint under `dir`
pub fn client_state(base_url: &str, dir: &Path) -> AppState {
    let config = AppConfig {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
            ..ApiConfig::default()
        },
        session: SessionConfig {
            hint_path: dir.join("last_identity.json"),
        },
        ..AppConfig::default()
    };
    AppState::new(config).expect("Failed to build client state")
}
