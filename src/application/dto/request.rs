//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Ids arrive as
//! strings and are parsed into snowflakes here, so handlers only see typed
//! service inputs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::application::services::{
    BookAppointmentDto, CreateInviteDto, CreateSalonDto, CreateTicketDto, NewSalonServiceDto,
    RegisterDto,
};
use crate::domain::{
    AppointmentStatus, ApprovalStatus, GlobalServiceChanges, GlobalServiceDraft, ProfileChanges,
    ProfileRole, SalonChanges, SalonServiceChanges, SalonStatus, StaffChanges, TicketPriority,
    TicketStatus,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::parse_id;

/// Parse a string id from a request body, reporting the offending field.
pub fn parse_field_id(field: &str, value: &str) -> Result<i64, AppError> {
    parse_id(value.trim()).map_err(|_| AppError::field(field, "Invalid id"))
}

fn parse_optional_id(field: &str, value: Option<&str>) -> Result<Option<i64>, AppError> {
    value.map(|v| parse_field_id(field, v)).transpose()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ----------------------------------------------------------------------------
// Auth
// ----------------------------------------------------------------------------

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Full name must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Full name is required")
    )]
    pub full_name: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

impl From<RegisterRequest> for RegisterDto {
    fn from(body: RegisterRequest) -> Self {
        Self {
            email: body.email,
            password: body.password,
            full_name: body.full_name.trim().to_string(),
            phone: trimmed(body.phone),
        }
    }
}

/// Refresh and logout request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

// ----------------------------------------------------------------------------
// Profiles
// ----------------------------------------------------------------------------

/// Update own profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 100, message = "Full name must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Full name is required")
    )]
    pub full_name: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar_url: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(body: UpdateProfileRequest) -> Self {
        Self {
            full_name: body.full_name.map(|n| n.trim().to_string()),
            phone: body.phone,
            avatar_url: body.avatar_url,
        }
    }
}

/// Admin role change
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

impl SetRoleRequest {
    pub fn role(&self) -> Result<ProfileRole, AppError> {
        ProfileRole::parse(&self.role).ok_or_else(|| AppError::field("role", "Unknown role"))
    }
}

/// Admin profile listing
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProfileQuery {
    pub fn role(&self) -> Result<Option<ProfileRole>, AppError> {
        self.role
            .as_deref()
            .map(|r| ProfileRole::parse(r).ok_or_else(|| AppError::field("role", "Unknown role")))
            .transpose()
    }
}

// ----------------------------------------------------------------------------
// Salons
// ----------------------------------------------------------------------------

/// Public salon search
#[derive(Debug, Deserialize)]
pub struct SalonQuery {
    pub city: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create salon request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalonRequest {
    #[serde(default)]
    #[validate(
        length(min = 2, max = 100, message = "Name must be 2-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Name is required")
    )]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Address is required"))]
    pub address: String,

    #[serde(default)]
    #[validate(custom(function = "crate::shared::validation::not_blank", message = "City is required"))]
    pub city: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(url(message = "Image must be a URL"))]
    pub image_url: Option<String>,

    pub opening_time: NaiveTime,

    pub closing_time: NaiveTime,

    #[serde(default)]
    #[validate(range(min = -720, max = 840, message = "UTC offset must be between -720 and 840 minutes"))]
    pub utc_offset_minutes: i32,
}

impl From<CreateSalonRequest> for CreateSalonDto {
    fn from(body: CreateSalonRequest) -> Self {
        Self {
            name: body.name.trim().to_string(),
            description: trimmed(body.description),
            address: body.address.trim().to_string(),
            city: body.city.trim().to_string(),
            phone: trimmed(body.phone),
            image_url: body.image_url,
            opening_time: body.opening_time,
            closing_time: body.closing_time,
            utc_offset_minutes: body.utc_offset_minutes,
        }
    }
}

/// Salon update request; queued for admin review
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalonRequest {
    #[validate(
        length(min = 2, max = 100, message = "Name must be 2-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Name is required")
    )]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Address is required"))]
    pub address: Option<String>,

    #[validate(custom(function = "crate::shared::validation::not_blank", message = "City is required"))]
    pub city: Option<String>,

    pub phone: Option<String>,

    #[validate(url(message = "Image must be a URL"))]
    pub image_url: Option<String>,

    pub opening_time: Option<NaiveTime>,

    pub closing_time: Option<NaiveTime>,

    #[validate(range(min = -720, max = 840, message = "UTC offset must be between -720 and 840 minutes"))]
    pub utc_offset_minutes: Option<i32>,
}

impl From<UpdateSalonRequest> for SalonChanges {
    fn from(body: UpdateSalonRequest) -> Self {
        Self {
            name: body.name.map(|n| n.trim().to_string()),
            description: body.description,
            address: body.address.map(|a| a.trim().to_string()),
            city: body.city.map(|c| c.trim().to_string()),
            phone: body.phone,
            image_url: body.image_url,
            opening_time: body.opening_time,
            closing_time: body.closing_time,
            utc_offset_minutes: body.utc_offset_minutes,
        }
    }
}

/// Admin status change
#[derive(Debug, Deserialize)]
pub struct SetSalonStatusRequest {
    pub status: String,
}

impl SetSalonStatusRequest {
    pub fn status(&self) -> Result<SalonStatus, AppError> {
        SalonStatus::parse(&self.status).ok_or_else(|| AppError::field("status", "Unknown status"))
    }
}

// ----------------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// New catalog entry (admin) or catalog proposal (owner)
#[derive(Debug, Deserialize, Validate)]
pub struct GlobalServiceRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name is required"),
        custom(function = "crate::shared::validation::not_blank", message = "Name is required")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "Category is required"),
        custom(function = "crate::shared::validation::not_blank", message = "Category is required")
    )]
    pub category: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

impl From<GlobalServiceRequest> for GlobalServiceDraft {
    fn from(body: GlobalServiceRequest) -> Self {
        Self {
            name: body.name.trim().to_string(),
            category: body.category.trim().to_string(),
            description: trimmed(body.description),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGlobalServiceRequest {
    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Name is required"))]
    pub name: Option<String>,

    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Category is required"))]
    pub category: Option<String>,

    pub description: Option<String>,

    pub is_active: Option<bool>,
}

impl From<UpdateGlobalServiceRequest> for GlobalServiceChanges {
    fn from(body: UpdateGlobalServiceRequest) -> Self {
        Self {
            name: body.name.map(|n| n.trim().to_string()),
            category: body.category.map(|c| c.trim().to_string()),
            description: body.description,
            is_active: body.is_active,
        }
    }
}

/// Add a service to a salon's menu. Name and category may be omitted when
/// a catalog entry is linked.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalonServiceRequest {
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Name is required")
    )]
    pub name: Option<String>,

    #[validate(
        length(max = 50, message = "Category must be at most 50 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Category is required")
    )]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: i64,

    pub duration_minutes: i32,

    pub global_service_id: Option<String>,
}

impl CreateSalonServiceRequest {
    pub fn into_dto(self) -> Result<NewSalonServiceDto, AppError> {
        Ok(NewSalonServiceDto {
            global_service_id: parse_optional_id("global_service_id", self.global_service_id.as_deref())?,
            name: self.name.map(|n| n.trim().to_string()),
            category: self.category.map(|c| c.trim().to_string()),
            price_cents: self.price_cents,
            duration_minutes: self.duration_minutes,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalonServiceRequest {
    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Name is required"))]
    pub name: Option<String>,

    #[validate(custom(function = "crate::shared::validation::not_blank", message = "Category is required"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: Option<i64>,

    pub duration_minutes: Option<i32>,

    pub is_active: Option<bool>,
}

impl From<UpdateSalonServiceRequest> for SalonServiceChanges {
    fn from(body: UpdateSalonServiceRequest) -> Self {
        Self {
            name: body.name.map(|n| n.trim().to_string()),
            category: body.category.map(|c| c.trim().to_string()),
            price_cents: body.price_cents,
            duration_minutes: body.duration_minutes,
            is_active: body.is_active,
        }
    }
}

// ----------------------------------------------------------------------------
// Staff and invites
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Display name must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Display name is required")
    )]
    pub display_name: String,

    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(
        length(min = 1, max = 100, message = "Display name must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Display name is required")
    )]
    pub display_name: Option<String>,

    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,

    pub is_active: Option<bool>,
}

impl From<UpdateStaffRequest> for StaffChanges {
    fn from(body: UpdateStaffRequest) -> Self {
        Self {
            display_name: body.display_name.map(|n| n.trim().to_string()),
            title: body.title,
            is_active: body.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Display name must be 1-100 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Display name is required")
    )]
    pub display_name: String,

    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
}

impl From<CreateInviteRequest> for CreateInviteDto {
    fn from(body: CreateInviteRequest) -> Self {
        Self {
            email: body.email,
            display_name: body.display_name.trim().to_string(),
            title: trimmed(body.title),
        }
    }
}

// ----------------------------------------------------------------------------
// Appointments
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct BookAppointmentRequest {
    pub salon_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub starts_at: DateTime<Utc>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

impl BookAppointmentRequest {
    pub fn into_dto(self) -> Result<BookAppointmentDto, AppError> {
        Ok(BookAppointmentDto {
            salon_id: parse_field_id("salon_id", &self.salon_id)?,
            staff_id: parse_field_id("staff_id", &self.staff_id)?,
            service_id: parse_field_id("service_id", &self.service_id)?,
            starts_at: self.starts_at,
            notes: trimmed(self.notes),
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelAppointmentRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

impl CancelAppointmentRequest {
    pub fn reason(self) -> Option<String> {
        trimmed(self.reason)
    }
}

/// Customer listing filter
#[derive(Debug, Deserialize)]
pub struct MyAppointmentsQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub upcoming: bool,
}

/// Owner listing filter
#[derive(Debug, Deserialize)]
pub struct SalonAppointmentsQuery {
    pub status: Option<String>,
    pub staff_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl SalonAppointmentsQuery {
    pub fn staff_id(&self) -> Result<Option<i64>, AppError> {
        parse_optional_id("staff_id", self.staff_id.as_deref())
    }
}

pub fn parse_appointment_status(value: Option<&str>) -> Result<Option<AppointmentStatus>, AppError> {
    value
        .map(|s| AppointmentStatus::parse(s).ok_or_else(|| AppError::field("status", "Unknown status")))
        .transpose()
}

/// `?date=YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub staff_id: String,
    pub service_id: String,
    pub date: NaiveDate,
}

// ----------------------------------------------------------------------------
// Tickets
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Subject must be 1-200 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Subject is required")
    )]
    pub subject: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Message must be 1-5000 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Message is required")
    )]
    pub body: String,

    pub salon_id: Option<String>,

    pub priority: Option<String>,
}

impl CreateTicketRequest {
    pub fn into_dto(self) -> Result<CreateTicketDto, AppError> {
        let priority = self
            .priority
            .as_deref()
            .map(|p| TicketPriority::parse(p).ok_or_else(|| AppError::field("priority", "Unknown priority")))
            .transpose()?;
        Ok(CreateTicketDto {
            salon_id: parse_optional_id("salon_id", self.salon_id.as_deref())?,
            subject: self.subject.trim().to_string(),
            body: self.body.trim().to_string(),
            priority,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Message must be 1-5000 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Message is required")
    )]
    pub body: String,
}

/// `?after=<message id>` for polling
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub after: Option<String>,
}

impl MessagesQuery {
    pub fn after(&self) -> Result<Option<i64>, AppError> {
        parse_optional_id("after", self.after.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: String,
}

impl TicketStatusRequest {
    pub fn status(&self) -> Result<TicketStatus, AppError> {
        TicketStatus::parse(&self.status).ok_or_else(|| AppError::field("status", "Unknown status"))
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    /// `null` clears the assignee
    pub assignee_id: Option<String>,
}

impl AssignTicketRequest {
    pub fn assignee_id(&self) -> Result<Option<i64>, AppError> {
        parse_optional_id("assignee_id", self.assignee_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn ticket_status(&self) -> Result<Option<TicketStatus>, AppError> {
        self.status
            .as_deref()
            .map(|s| TicketStatus::parse(s).ok_or_else(|| AppError::field("status", "Unknown status")))
            .transpose()
    }

    pub fn approval_status(&self) -> Result<Option<ApprovalStatus>, AppError> {
        self.status
            .as_deref()
            .map(|s| ApprovalStatus::parse(s).ok_or_else(|| AppError::field("status", "Unknown status")))
            .transpose()
    }
}

// ----------------------------------------------------------------------------
// Approvals
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewRequest {
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::FieldError;
    use crate::shared::validation::validate;
    use pretty_assertions::assert_eq;

    fn field_errors(err: AppError) -> Vec<FieldError> {
        match err {
            AppError::InvalidFields(fields) => fields,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_category_is_reported() {
        let body: GlobalServiceRequest =
            serde_json::from_str(r#"{ "name": "Balayage" }"#).unwrap();
        let fields = field_errors(validate(&body).unwrap_err());
        assert_eq!(
            fields,
            vec![FieldError {
                field: "category".into(),
                message: "Category is required".into()
            }]
        );
    }

    #[test]
    fn test_blank_salon_service_category_is_reported() {
        let body: CreateSalonServiceRequest = serde_json::from_str(
            r#"{ "name": "Trim", "category": "  ", "price_cents": 1500, "duration_minutes": 30 }"#,
        )
        .unwrap();
        let fields = field_errors(validate(&body).unwrap_err());
        assert_eq!(fields[0].field, "category");
        assert_eq!(fields[0].message, "Category is required");
    }

    #[test]
    fn test_negative_price_is_reported() {
        let body: CreateSalonServiceRequest = serde_json::from_str(
            r#"{ "name": "Trim", "category": "Hair", "price_cents": -1, "duration_minutes": 30 }"#,
        )
        .unwrap();
        let fields = field_errors(validate(&body).unwrap_err());
        assert_eq!(fields[0].field, "price_cents");
    }

    #[test]
    fn test_booking_ids_are_parsed() {
        let body: BookAppointmentRequest = serde_json::from_str(
            r#"{ "salon_id": "10", "staff_id": "20", "service_id": "30",
                 "starts_at": "2030-01-01T10:00:00Z", "notes": " " }"#,
        )
        .unwrap();
        let dto = body.into_dto().unwrap();
        assert_eq!((dto.salon_id, dto.staff_id, dto.service_id), (10, 20, 30));
        assert_eq!(dto.notes, None);
    }

    #[test]
    fn test_bad_booking_id_names_field() {
        let body: BookAppointmentRequest = serde_json::from_str(
            r#"{ "salon_id": "10", "staff_id": "abc", "service_id": "30",
                 "starts_at": "2030-01-01T10:00:00Z" }"#,
        )
        .unwrap();
        let fields = field_errors(body.into_dto().unwrap_err());
        assert_eq!(fields[0].field, "staff_id");
    }

    #[test]
    fn test_salon_hours_parse() {
        let body: CreateSalonRequest = serde_json::from_str(
            r#"{ "name": "Curl Up", "address": "2 Side St", "city": "York",
                 "opening_time": "09:00:00", "closing_time": "17:30:00" }"#,
        )
        .unwrap();
        assert!(validate(&body).is_ok());
        let dto = CreateSalonDto::from(body);
        assert_eq!(dto.utc_offset_minutes, 0);
        assert!(dto.opening_time < dto.closing_time);
    }

    #[test]
    fn test_unknown_ticket_status() {
        let query = StatusQuery {
            status: Some("closed".into()),
        };
        assert!(query.ticket_status().is_err());
        let query = StatusQuery {
            status: Some("in_progress".into()),
        };
        assert_eq!(query.ticket_status().unwrap(), Some(TicketStatus::InProgress));
    }
}
