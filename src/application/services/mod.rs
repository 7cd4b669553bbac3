//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, token refresh and logout
//! - **ProfileService**: Own profile and admin role management
//! - **SalonDirectory**: Salon listings, owner salons, status moderation
//! - **CatalogService**: Platform service catalog and per-salon services
//! - **StaffService**: Salon staff management
//! - **InviteService**: Staff invite codes
//! - **AppointmentService**: Booking, state machine, calendars, availability
//! - **TicketService**: Support tickets and their message threads
//! - **ApprovalService**: Admin review of owner-submitted changes
//! - **DashboardService**: Admin and owner summary figures

pub mod appointment_service;
pub mod approval_service;
pub mod auth_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod invite_service;
pub mod profile_service;
pub mod salon_service;
pub mod staff_service;
pub mod ticket_service;

pub use appointment_service::{
    AppointmentService, AppointmentServiceImpl, BookAppointmentDto, BookingError, DayCalendar,
};
pub use approval_service::{ApprovalError, ApprovalService, ApprovalServiceImpl};
pub use auth_service::{
    decode_access_token, encode_access_token, AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims, RegisterDto,
};
pub use catalog_service::{
    CatalogCache, CatalogError, CatalogService, CatalogServiceImpl, NewSalonServiceDto,
};
pub use dashboard_service::{
    AdminDashboard, DashboardError, DashboardService, DashboardServiceImpl, OwnerDashboard,
    StatusCount,
};
pub use invite_service::{CreateInviteDto, InviteError, InviteService, InviteServiceImpl};
pub use profile_service::{ProfileError, ProfileService, ProfileServiceImpl};
pub use salon_service::{CreateSalonDto, SalonDirectory, SalonError, SalonServiceImpl};
pub use staff_service::{StaffError, StaffService, StaffServiceImpl};
pub use ticket_service::{CreateTicketDto, TicketError, TicketService, TicketServiceImpl};
