//! Library Client - command line front end
//!
//! Resolves the session, then runs one command against the backend.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_client::{
    config::{AppConfig, LoggingConfig},
    models::{BookStatus, LoanForm, ReservationForm, Session},
    services::{gate::ActionVisibility, navigation},
    AppResult, AppState,
};

#[derive(Parser)]
#[command(name = "library-client", version, about = "Library loans and reservations client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current session and what it may do
    Status,
    /// Log in to the backend
    Login { username: String, password: String },
    /// End the current session
    Logout,
    /// List the catalog
    Books,
    /// List library members
    Members,
    /// Lend a book to a member
    Loan {
        book: String,
        member: String,
        /// YYYY-MM-DD
        return_date: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        loan_date: Option<String>,
    },
    /// Reserve a book for a member
    Reserve {
        book: String,
        member: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    tracing::debug!("Starting library-client v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config)?;
    state.services.session.bootstrap().await;

    if let Err(e) = run(cli.command.unwrap_or(Command::Status), &state).await {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_client={}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Command, state: &AppState) -> AppResult<()> {
    let services = &state.services;

    match command {
        Command::Status => print_status(&services.session.current()),
        Command::Login { username, password } => {
            let session = services.session.login(&username, &password).await?;
            print_status(&session);
        }
        Command::Logout => {
            services.session.logout().await?;
            println!("Logged out");
        }
        Command::Books => {
            for book in services.catalog.list_books().await? {
                println!(
                    "{}  {}  [{}]",
                    book.id,
                    book.title.as_deref().unwrap_or("-"),
                    book.status
                );
            }
        }
        Command::Members => {
            for member in services.catalog.list_members().await? {
                println!("{}  {}", member.id, member.title.as_deref().unwrap_or("-"));
            }
        }
        Command::Loan {
            book,
            member,
            return_date,
            loan_date,
        } => {
            let mut form = LoanForm::new(book, member, return_date);
            form.loan_date = loan_date;
            let loan_id = services.transactions.submit_loan(&form).await?;
            println!("Loan {} created", loan_id);
            report_book_status(state, &form.book_id).await;
        }
        Command::Reserve { book, member, date } => {
            let mut form = ReservationForm::new(book, member);
            form.reservation_date = date;
            let reservation_id = services.transactions.submit_reservation(&form).await?;
            println!("Reservation {} created", reservation_id);
            report_book_status(state, &form.book_id).await;
        }
    }
    Ok(())
}

/// Re-read a book after a transaction. The transaction already happened, so a
/// failed read is only a warning.
async fn report_book_status(state: &AppState, book_id: &str) -> Option<BookStatus> {
    match state.services.catalog.book_status(book_id.trim()).await {
        Ok(status) => {
            println!("Book {} is now {}", book_id, status);
            Some(status)
        }
        Err(e) => {
            tracing::warn!("Could not refresh book {} after the transaction: {}", book_id, e);
            eprintln!("Warning: could not refresh the book status: {}", e.user_message());
            None
        }
    }
}

fn print_status(session: &Session) {
    println!("Session: {}", session.describe());
    if !session.roles().is_empty() {
        let roles: Vec<&str> = session.roles().iter().map(|r| r.as_str()).collect();
        println!("Roles: {}", roles.join(", "));
    }

    let items: Vec<&str> = navigation::visible(session)
        .iter()
        .map(|item| item.label)
        .collect();
    if !items.is_empty() {
        println!("Navigation: {}", items.join(" | "));
    }

    let actions = ActionVisibility::for_session(session);
    println!(
        "Can edit catalog: {}, issue loans: {}, reserve: {}",
        actions.edit_catalog, actions.issue_loans, actions.make_reservations
    );
}
