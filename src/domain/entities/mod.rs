//! # Domain Entities
//!
//! Core domain entities representing the business objects of the salon
//! marketplace. All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **Profile**: Platform account with role (customer, owner, staff, admin)
//! - **Salon**: A business listing with opening hours and moderation status
//! - **Staff**: A bookable employee of a salon
//! - **GlobalService / SalonService**: Platform catalog and per-salon offering
//! - **Appointment**: A booking of a service with a staff member
//!
//! ## Supporting Entities
//!
//! - **SupportTicket / TicketMessage**: Help desk conversations
//! - **ApprovalRequest**: Owner changes awaiting admin review
//! - **Invite**: Staff invitation codes
//! - **Session**: Refresh token sessions
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod appointment;
mod approval;
mod invite;
mod profile;
mod salon;
mod service;
mod session;
mod staff;
mod ticket;

pub use appointment::{
    Appointment, AppointmentFilter, AppointmentRepository, AppointmentStatus, AppointmentSummary,
    StatusChange,
};
pub use approval::{
    ApprovalDecision, ApprovalEffect, ApprovalKind, ApprovalRepository, ApprovalRequest,
    ApprovalStatus,
};
pub use invite::{Invite, InvitePreview, InviteRepository, InviteState};
pub use profile::{Profile, ProfileChanges, ProfileRepository};
pub use salon::{Salon, SalonChanges, SalonFilter, SalonRepository, SalonStatus};
pub use service::{
    GlobalService, GlobalServiceChanges, GlobalServiceDraft, GlobalServiceRepository,
    SalonService, SalonServiceChanges, SalonServiceRepository,
};
pub use session::{Session, SessionRepository};
pub use staff::{Deactivation, Staff, StaffChanges, StaffRepository};
pub use ticket::{SupportTicket, TicketMessage, TicketPriority, TicketRepository, TicketStatus};

#[cfg(test)]
pub use appointment::MockAppointmentRepository;
#[cfg(test)]
pub use approval::MockApprovalRepository;
#[cfg(test)]
pub use invite::MockInviteRepository;
#[cfg(test)]
pub use profile::MockProfileRepository;
#[cfg(test)]
pub use salon::MockSalonRepository;
#[cfg(test)]
pub use service::{MockGlobalServiceRepository, MockSalonServiceRepository};
#[cfg(test)]
pub use session::MockSessionRepository;
#[cfg(test)]
pub use staff::MockStaffRepository;
#[cfg(test)]
pub use ticket::MockTicketRepository;
