//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings so JavaScript clients do not lose precision.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::application::services::{
    AuthTokens, DayCalendar, OwnerDashboard,
};
use crate::domain::services::GridCell;
use crate::domain::{
    Appointment, AppointmentStatus, AppointmentSummary, ApprovalKind, ApprovalRequest,
    ApprovalStatus, GlobalService, Invite, InvitePreview, InviteState, Profile, ProfileRole, Salon,
    SalonService, SalonStatus, Staff, SupportTicket, TicketMessage, TicketPriority, TicketStatus,
};

fn id(value: i64) -> String {
    value.to_string()
}

fn opt_id(value: Option<i64>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Registration and login response (profile and tokens)
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub profile: ProfileResponse,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

impl SessionResponse {
    pub fn new(profile: Profile, tokens: AuthTokens) -> Self {
        Self {
            profile: profile.into(),
            tokens: tokens.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: ProfileRole,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: id(p.id),
            email: p.email,
            full_name: p.full_name,
            phone: p.phone,
            avatar_url: p.avatar_url,
            role: p.role,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalonResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub status: SalonStatus,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub utc_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Salon> for SalonResponse {
    fn from(s: Salon) -> Self {
        Self {
            id: id(s.id),
            owner_id: id(s.owner_id),
            name: s.name,
            description: s.description,
            address: s.address,
            city: s.city,
            phone: s.phone,
            image_url: s.image_url,
            status: s.status,
            opening_time: s.opening_time,
            closing_time: s.closing_time,
            utc_offset_minutes: s.utc_offset_minutes,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StaffResponse {
    pub id: String,
    pub salon_id: String,
    pub profile_id: Option<String>,
    pub display_name: String,
    pub title: Option<String>,
    pub is_active: bool,
}

impl From<Staff> for StaffResponse {
    fn from(s: Staff) -> Self {
        Self {
            id: id(s.id),
            salon_id: id(s.salon_id),
            profile_id: opt_id(s.profile_id),
            display_name: s.display_name,
            title: s.title,
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GlobalServiceResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<GlobalService> for GlobalServiceResponse {
    fn from(g: GlobalService) -> Self {
        Self {
            id: id(g.id),
            name: g.name,
            category: g.category,
            description: g.description,
            is_active: g.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalonServiceResponse {
    pub id: String,
    pub salon_id: String,
    pub global_service_id: Option<String>,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub is_active: bool,
}

impl From<SalonService> for SalonServiceResponse {
    fn from(s: SalonService) -> Self {
        Self {
            id: id(s.id),
            salon_id: id(s.salon_id),
            global_service_id: opt_id(s.global_service_id),
            name: s.name,
            category: s.category,
            price_cents: s.price_cents,
            duration_minutes: s.duration_minutes,
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub id: String,
    pub salon_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: id(a.id),
            salon_id: id(a.salon_id),
            staff_id: id(a.staff_id),
            service_id: id(a.service_id),
            customer_id: id(a.customer_id),
            starts_at: a.starts_at,
            ends_at: a.ends_at,
            status: a.status,
            price_cents: a.price_cents,
            notes: a.notes,
            cancellation_reason: a.cancellation_reason,
            created_at: a.created_at,
        }
    }
}

/// Appointment row of a list or table, with display names
#[derive(Debug, Serialize)]
pub struct AppointmentListItem {
    #[serde(flatten)]
    pub appointment: AppointmentResponse,
    pub salon_name: String,
    pub staff_name: String,
    pub service_name: String,
    pub customer_name: String,
}

impl From<AppointmentSummary> for AppointmentListItem {
    fn from(s: AppointmentSummary) -> Self {
        Self {
            appointment: s.appointment.into(),
            salon_name: s.salon_name,
            staff_name: s.staff_name,
            service_name: s.service_name,
            customer_name: s.customer_name,
        }
    }
}

/// Column header of the day calendar
#[derive(Debug, Serialize)]
pub struct CalendarColumn {
    pub staff_id: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarCell {
    Free,
    Booked {
        appointment_id: String,
        customer_name: String,
        service_name: String,
        status: AppointmentStatus,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    Past,
}

impl From<GridCell> for CalendarCell {
    fn from(cell: GridCell) -> Self {
        match cell {
            GridCell::Free => Self::Free,
            GridCell::Past => Self::Past,
            GridCell::Booked(slot) => Self::Booked {
                appointment_id: id(slot.appointment_id),
                customer_name: slot.customer_name,
                service_name: slot.service_name,
                status: slot.status,
                starts_at: slot.starts_at,
                ends_at: slot.ends_at,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarRow {
    pub starts_at: DateTime<Utc>,
    pub local_time: NaiveTime,
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Serialize)]
pub struct DayCalendarResponse {
    pub salon_id: String,
    pub salon_name: String,
    pub date: NaiveDate,
    pub columns: Vec<CalendarColumn>,
    pub rows: Vec<CalendarRow>,
}

impl From<DayCalendar> for DayCalendarResponse {
    fn from(c: DayCalendar) -> Self {
        Self {
            salon_id: id(c.salon.id),
            salon_name: c.salon.name,
            date: c.date,
            columns: c
                .staff
                .into_iter()
                .map(|s| CalendarColumn {
                    staff_id: id(s.id),
                    display_name: s.display_name,
                })
                .collect(),
            rows: c
                .rows
                .into_iter()
                .map(|r| CalendarRow {
                    starts_at: r.starts_at,
                    local_time: r.local_time,
                    cells: r.cells.into_iter().map(CalendarCell::from).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub starts: Vec<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub code: String,
    pub salon_id: String,
    pub email: String,
    pub display_name: String,
    pub title: Option<String>,
    pub state: InviteState,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Invite> for InviteResponse {
    fn from(i: Invite) -> Self {
        Self {
            state: i.state(),
            code: i.code,
            salon_id: id(i.salon_id),
            email: i.email,
            display_name: i.display_name,
            title: i.title,
            expires_at: i.expires_at,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvitePreviewResponse {
    pub code: String,
    pub salon_id: String,
    pub salon_name: String,
    pub email: String,
    pub display_name: String,
    pub state: InviteState,
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<InvitePreview> for InvitePreviewResponse {
    fn from(p: InvitePreview) -> Self {
        let state = p.invite.state();
        Self {
            code: p.invite.code,
            salon_id: id(p.invite.salon_id),
            salon_name: p.salon_name,
            email: p.invite.email,
            display_name: p.invite.display_name,
            valid: state == InviteState::Valid,
            state,
            expires_at: p.invite.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub requester_id: String,
    pub salon_id: Option<String>,
    pub assignee_id: Option<String>,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SupportTicket> for TicketResponse {
    fn from(t: SupportTicket) -> Self {
        Self {
            id: id(t.id),
            requester_id: id(t.requester_id),
            salon_id: opt_id(t.salon_id),
            assignee_id: opt_id(t.assignee_id),
            subject: t.subject,
            status: t.status,
            priority: t.priority,
            resolved_at: t.resolved_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketMessageResponse {
    pub id: String,
    pub ticket_id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<TicketMessage> for TicketMessageResponse {
    fn from(m: TicketMessage) -> Self {
        Self {
            id: id(m.id),
            ticket_id: id(m.ticket_id),
            author_id: id(m.author_id),
            author_name: m.author_name,
            body: m.body,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub id: String,
    pub salon_id: String,
    pub requested_by: String,
    pub kind: ApprovalKind,
    pub payload: serde_json::Value,
    pub status: ApprovalStatus,
    pub reviewer_id: Option<String>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApprovalRequest> for ApprovalResponse {
    fn from(r: ApprovalRequest) -> Self {
        Self {
            id: id(r.id),
            salon_id: id(r.salon_id),
            requested_by: id(r.requested_by),
            kind: r.kind,
            payload: r.payload,
            status: r.status,
            reviewer_id: opt_id(r.reviewer_id),
            review_note: r.review_note,
            reviewed_at: r.reviewed_at,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerDashboardResponse {
    pub salon_id: String,
    pub date: NaiveDate,
    pub todays_appointments: Vec<AppointmentListItem>,
    pub upcoming_count: i64,
    pub month_revenue_cents: i64,
    pub active_staff: i64,
}

impl From<OwnerDashboard> for OwnerDashboardResponse {
    fn from(d: OwnerDashboard) -> Self {
        Self {
            salon_id: id(d.salon_id),
            date: d.date,
            todays_appointments: d.todays_appointments.into_iter().map(Into::into).collect(),
            upcoming_count: d.upcoming_count,
            month_revenue_cents: d.month_revenue_cents,
            active_staff: d.active_staff,
        }
    }
}

/// Map a list of entities into their response shape.
pub fn list<T, R: From<T>>(items: Vec<T>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
