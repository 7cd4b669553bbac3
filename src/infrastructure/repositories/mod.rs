//! Repository Implementations
//!
//! PostgreSQL implementations of the repository traits defined in the
//! domain layer. Each repository owns a `PgPool` clone; the few writes that
//! span tables (salon creation, booking, approval review, invite acceptance)
//! open their own transaction.

pub mod appointment_repository;
pub mod approval_repository;
pub mod invite_repository;
pub mod profile_repository;
pub mod salon_repository;
pub mod service_repository;
pub mod session_repository;
pub mod staff_repository;
pub mod ticket_repository;

pub use appointment_repository::PgAppointmentRepository;
pub use approval_repository::PgApprovalRepository;
pub use invite_repository::PgInviteRepository;
pub use profile_repository::PgProfileRepository;
pub use salon_repository::PgSalonRepository;
pub use service_repository::{PgGlobalServiceRepository, PgSalonServiceRepository};
pub use session_repository::PgSessionRepository;
pub use staff_repository::PgStaffRepository;
pub use ticket_repository::PgTicketRepository;

use crate::shared::error::AppError;

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn unique_violation(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}
