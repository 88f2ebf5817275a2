//! Data models for the library client

pub mod book;
pub mod identity;
pub mod loan;
pub mod member;
pub mod role;
pub mod session;

// Re-export commonly used types
pub use book::{Book, BookInput, BookStatus};
pub use identity::Identity;
pub use loan::{
    LoanForm, LoanId, LoanTransaction, ReservationForm, ReservationId, ReservationTransaction,
};
pub use member::{Member, MemberInput};
pub use role::Role;
pub use session::{Session, SessionStatus, SessionTrust};
