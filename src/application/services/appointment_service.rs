//! Appointment Service
//!
//! Booking, the appointment state machine, calendars and availability.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::instrument;

use crate::config::BookingSettings;
use crate::domain::services::schedule::{self, BookingRules, GridRow, ScheduleViolation};
use crate::domain::services::{AccessPolicy, AppointmentAccess};
use crate::domain::{
    Actor, Appointment, AppointmentFilter, AppointmentRepository, AppointmentStatus,
    AppointmentSummary, Salon, SalonRepository, SalonService, SalonServiceRepository, Staff,
    StaffRepository, StatusChange, TimeRange,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

const LIST_LIMIT: i64 = 200;

/// Appointment service trait
#[async_trait]
pub trait AppointmentService: Send + Sync {
    /// Customer books a slot; the appointment starts PENDING
    async fn book(&self, actor: &Actor, request: BookAppointmentDto) -> Result<Appointment, BookingError>;

    async fn list_my_appointments(
        &self,
        actor: &Actor,
        status: Option<AppointmentStatus>,
        upcoming_only: bool,
    ) -> Result<Vec<AppointmentSummary>, BookingError>;

    /// Owner back office listing for one salon
    async fn list_salon_appointments(
        &self,
        actor: &Actor,
        salon_id: i64,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentSummary>, BookingError>;

    async fn cancel(&self, actor: &Actor, appointment_id: i64, reason: Option<String>)
        -> Result<Appointment, BookingError>;

    async fn confirm(&self, actor: &Actor, appointment_id: i64) -> Result<Appointment, BookingError>;

    async fn complete(&self, actor: &Actor, appointment_id: i64) -> Result<Appointment, BookingError>;

    /// Slot rows by staff columns for one salon-local day
    async fn salon_day_calendar(&self, actor: &Actor, salon_id: i64, date: NaiveDate)
        -> Result<DayCalendar, BookingError>;

    /// The caller's own appointments as staff, across their salons
    async fn my_schedule(&self, actor: &Actor, date: NaiveDate)
        -> Result<Vec<AppointmentSummary>, BookingError>;

    /// Public: bookable start times for a staff member and service
    async fn availability(
        &self,
        salon_id: i64,
        staff_id: i64,
        service_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, BookingError>;
}

/// Booking input
#[derive(Debug, Clone)]
pub struct BookAppointmentDto {
    pub salon_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub starts_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Day calendar of a salon
#[derive(Debug, Clone)]
pub struct DayCalendar {
    pub salon: Salon,
    pub date: NaiveDate,
    /// Column order of every row's cells
    pub staff: Vec<Staff>,
    pub rows: Vec<GridRow>,
}

/// Booking errors
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Salon is not accepting bookings")]
    SalonNotBookable,

    #[error("Staff member is not available at this salon")]
    StaffUnavailable,

    #[error("Service is not available at this salon")]
    ServiceUnavailable,

    #[error("{0}")]
    Schedule(#[from] ScheduleViolation),

    #[error("Not allowed to change this appointment")]
    Forbidden,

    #[error("Appointment is {from} and cannot become {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointments can only be cancelled up to {0} hours before the start")]
    CancellationWindowClosed(i64),

    #[error("Appointment has not started yet")]
    NotStarted,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::NotFound(_) => AppError::NotFound(e.to_string()),
            BookingError::Forbidden => AppError::Forbidden(e.to_string()),
            BookingError::Schedule(ScheduleViolation::Overlaps)
            | BookingError::InvalidTransition { .. }
            | BookingError::CancellationWindowClosed(_)
            | BookingError::NotStarted => AppError::Conflict(e.to_string()),
            BookingError::Schedule(v) => AppError::field("starts_at", &v.to_string()),
            BookingError::SalonNotBookable
            | BookingError::StaffUnavailable
            | BookingError::ServiceUnavailable => AppError::BadRequest(e.to_string()),
            BookingError::Store(inner) => inner,
        }
    }
}

/// AppointmentService implementation
pub struct AppointmentServiceImpl<P, S, T, V>
where
    P: AppointmentRepository,
    S: SalonRepository,
    T: StaffRepository,
    V: SalonServiceRepository,
{
    appointment_repo: Arc<P>,
    salon_repo: Arc<S>,
    staff_repo: Arc<T>,
    service_repo: Arc<V>,
    id_generator: Arc<SnowflakeGenerator>,
    rules: BookingRules,
    cancellation_cutoff: Duration,
}

impl<P, S, T, V> AppointmentServiceImpl<P, S, T, V>
where
    P: AppointmentRepository,
    S: SalonRepository,
    T: StaffRepository,
    V: SalonServiceRepository,
{
    pub fn new(
        appointment_repo: Arc<P>,
        salon_repo: Arc<S>,
        staff_repo: Arc<T>,
        service_repo: Arc<V>,
        id_generator: Arc<SnowflakeGenerator>,
        settings: &BookingSettings,
    ) -> Self {
        Self {
            appointment_repo,
            salon_repo,
            staff_repo,
            service_repo,
            id_generator,
            rules: BookingRules {
                slot_interval: Duration::minutes(i64::from(settings.slot_interval_minutes)),
                max_advance: Duration::days(settings.max_advance_days),
            },
            cancellation_cutoff: Duration::hours(settings.cancellation_cutoff_hours),
        }
    }

    async fn salon(&self, salon_id: i64) -> Result<Salon, BookingError> {
        self.salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(BookingError::NotFound("Salon"))
    }

    /// Salon, staff member and service of a booking, all checked bookable.
    async fn bookable(
        &self,
        salon_id: i64,
        staff_id: i64,
        service_id: i64,
    ) -> Result<(Salon, Staff, SalonService), BookingError> {
        let salon = self.salon(salon_id).await?;
        if !salon.is_public() {
            return Err(BookingError::SalonNotBookable);
        }
        let staff = self
            .staff_repo
            .find_by_id(staff_id)
            .await?
            .filter(|s| s.is_bookable_at(salon_id))
            .ok_or(BookingError::StaffUnavailable)?;
        let service = self
            .service_repo
            .find_by_id(service_id)
            .await?
            .filter(|s| s.is_bookable_at(salon_id))
            .ok_or(BookingError::ServiceUnavailable)?;
        Ok((salon, staff, service))
    }

    /// Slot-blocking ranges of a staff member over the salon-local day.
    async fn busy_on(&self, salon: &Salon, staff_id: i64, date: NaiveDate) -> Result<Vec<TimeRange>, BookingError> {
        let Some(day) = schedule::local_day(salon, date) else {
            return Ok(Vec::new());
        };
        Ok(self
            .appointment_repo
            .find_blocking(staff_id, day)
            .await?
            .iter()
            .map(Appointment::range)
            .collect())
    }

    /// Appointment plus how the caller relates to it. Unrelated callers see 404.
    async fn with_access(
        &self,
        actor: &Actor,
        appointment_id: i64,
    ) -> Result<(Appointment, AppointmentAccess), BookingError> {
        let appointment = self
            .appointment_repo
            .find_by_id(appointment_id)
            .await?
            .ok_or(BookingError::NotFound("Appointment"))?;
        let salon = self.salon(appointment.salon_id).await?;
        let staff = self
            .staff_repo
            .find_by_id(appointment.staff_id)
            .await?
            .ok_or(BookingError::NotFound("Staff member"))?;

        let access = AccessPolicy::appointment_access(actor, &appointment, &salon, &staff);
        if !access.can_view() {
            return Err(BookingError::NotFound("Appointment"));
        }
        Ok((appointment, access))
    }

    async fn transition(
        &self,
        appointment: &Appointment,
        to: AppointmentStatus,
        cancellation: Option<(i64, Option<String>)>,
    ) -> Result<Appointment, BookingError> {
        if !appointment.status.can_transition_to(to) {
            return Err(BookingError::InvalidTransition {
                from: appointment.status,
                to,
            });
        }
        let (cancelled_by, cancellation_reason) = match cancellation {
            Some((by, reason)) => (Some(by), reason),
            None => (None, None),
        };
        let change = StatusChange {
            status: to,
            expected_current: appointment.status,
            cancellation_reason,
            cancelled_by,
        };
        Ok(self.appointment_repo.change_status(appointment.id, &change).await?)
    }
}

#[async_trait]
impl<P, S, T, V> AppointmentService for AppointmentServiceImpl<P, S, T, V>
where
    P: AppointmentRepository + 'static,
    S: SalonRepository + 'static,
    T: StaffRepository + 'static,
    V: SalonServiceRepository + 'static,
{
    #[instrument(skip(self, request), fields(customer_id = actor.profile_id, salon_id = request.salon_id))]
    async fn book(&self, actor: &Actor, request: BookAppointmentDto) -> Result<Appointment, BookingError> {
        let (salon, staff, service) = self
            .bookable(request.salon_id, request.staff_id, request.service_id)
            .await?;

        let now = Utc::now();
        let date = schedule::local_date(&salon, request.starts_at);
        let busy = self.busy_on(&salon, staff.id, date).await?;
        let range = schedule::validate_booking(
            &salon,
            request.starts_at,
            service.duration(),
            &self.rules,
            &busy,
            now,
        )?;

        let appointment = Appointment {
            id: self.id_generator.generate(),
            salon_id: salon.id,
            staff_id: staff.id,
            service_id: service.id,
            customer_id: actor.profile_id,
            starts_at: range.start,
            ends_at: range.end,
            status: AppointmentStatus::Pending,
            price_cents: service.price_cents,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            cancellation_reason: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };

        // The repository repeats the overlap check under a staff row lock
        let booked = self.appointment_repo.insert_if_free(&appointment).await?;
        tracing::info!(
            appointment_id = booked.id,
            staff_id = booked.staff_id,
            starts_at = %booked.starts_at,
            "Appointment booked"
        );
        Ok(booked)
    }

    async fn list_my_appointments(
        &self,
        actor: &Actor,
        status: Option<AppointmentStatus>,
        upcoming_only: bool,
    ) -> Result<Vec<AppointmentSummary>, BookingError> {
        let filter = AppointmentFilter {
            customer_id: Some(actor.profile_id),
            status,
            from: upcoming_only.then(Utc::now),
            limit: LIST_LIMIT,
            ..Default::default()
        };
        Ok(self.appointment_repo.list(&filter).await?)
    }

    async fn list_salon_appointments(
        &self,
        actor: &Actor,
        salon_id: i64,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentSummary>, BookingError> {
        let salon = self.salon(salon_id).await?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(BookingError::Forbidden);
        }
        let filter = AppointmentFilter {
            salon_id: Some(salon_id),
            customer_id: None,
            limit: filter.limit.clamp(1, LIST_LIMIT),
            ..filter
        };
        Ok(self.appointment_repo.list(&filter).await?)
    }

    #[instrument(skip(self, reason), fields(actor_id = actor.profile_id))]
    async fn cancel(
        &self,
        actor: &Actor,
        appointment_id: i64,
        reason: Option<String>,
    ) -> Result<Appointment, BookingError> {
        let (appointment, access) = self.with_access(actor, appointment_id).await?;

        if !access.bypasses_cutoff()
            && Utc::now() + self.cancellation_cutoff > appointment.starts_at
            && !appointment.status.is_terminal()
        {
            return Err(BookingError::CancellationWindowClosed(
                self.cancellation_cutoff.num_hours(),
            ));
        }

        let reason = reason.filter(|r| !r.trim().is_empty());
        let cancelled = self
            .transition(
                &appointment,
                AppointmentStatus::Cancelled,
                Some((actor.profile_id, reason)),
            )
            .await?;
        tracing::info!(appointment_id, by_customer = !access.bypasses_cutoff(), "Appointment cancelled");
        Ok(cancelled)
    }

    #[instrument(skip(self), fields(actor_id = actor.profile_id))]
    async fn confirm(&self, actor: &Actor, appointment_id: i64) -> Result<Appointment, BookingError> {
        let (appointment, access) = self.with_access(actor, appointment_id).await?;
        if !access.can_progress() {
            return Err(BookingError::Forbidden);
        }
        self.transition(&appointment, AppointmentStatus::Confirmed, None).await
    }

    #[instrument(skip(self), fields(actor_id = actor.profile_id))]
    async fn complete(&self, actor: &Actor, appointment_id: i64) -> Result<Appointment, BookingError> {
        let (appointment, access) = self.with_access(actor, appointment_id).await?;
        if !access.can_progress() {
            return Err(BookingError::Forbidden);
        }
        if appointment.status.can_transition_to(AppointmentStatus::Completed)
            && Utc::now() < appointment.starts_at
        {
            return Err(BookingError::NotStarted);
        }
        self.transition(&appointment, AppointmentStatus::Completed, None).await
    }

    async fn salon_day_calendar(
        &self,
        actor: &Actor,
        salon_id: i64,
        date: NaiveDate,
    ) -> Result<DayCalendar, BookingError> {
        let salon = self.salon(salon_id).await?;
        let memberships = if AccessPolicy::can_manage_salon(actor, &salon) {
            Vec::new()
        } else {
            self.staff_repo.find_by_profile(actor.profile_id).await?
        };
        if !AccessPolicy::can_view_calendar(actor, &salon, &memberships) {
            return Err(BookingError::Forbidden);
        }

        let staff = self.staff_repo.find_by_salon(salon_id, false).await?;
        let appointments = match schedule::local_day(&salon, date) {
            Some(day) => {
                let filter = AppointmentFilter {
                    salon_id: Some(salon_id),
                    from: Some(day.start),
                    until: Some(day.end),
                    limit: i64::MAX,
                    ..Default::default()
                };
                self.appointment_repo.list(&filter).await?
            }
            None => Vec::new(),
        };

        let rows = schedule::day_grid(
            &salon,
            date,
            self.rules.slot_interval,
            &staff,
            &appointments,
            Utc::now(),
        );
        Ok(DayCalendar {
            salon,
            date,
            staff,
            rows,
        })
    }

    async fn my_schedule(&self, actor: &Actor, date: NaiveDate) -> Result<Vec<AppointmentSummary>, BookingError> {
        let memberships = self.staff_repo.find_by_profile(actor.profile_id).await?;

        let mut schedule = Vec::new();
        for membership in memberships.iter().filter(|m| m.is_active) {
            let salon = self.salon(membership.salon_id).await?;
            let Some(day) = schedule::local_day(&salon, date) else {
                continue;
            };
            let filter = AppointmentFilter {
                staff_id: Some(membership.id),
                from: Some(day.start),
                until: Some(day.end),
                limit: LIST_LIMIT,
                ..Default::default()
            };
            schedule.extend(
                self.appointment_repo
                    .list(&filter)
                    .await?
                    .into_iter()
                    .filter(|s| s.appointment.status != AppointmentStatus::Cancelled),
            );
        }
        schedule.sort_by_key(|s| s.appointment.starts_at);
        Ok(schedule)
    }

    async fn availability(
        &self,
        salon_id: i64,
        staff_id: i64,
        service_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, BookingError> {
        let (salon, staff, service) = self.bookable(salon_id, staff_id, service_id).await?;
        let busy = self.busy_on(&salon, staff.id, date).await?;
        Ok(schedule::available_starts(
            &salon,
            date,
            service.duration(),
            &self.rules,
            &busy,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_settings;
    use crate::domain::{
        MockAppointmentRepository, MockSalonRepository, MockSalonServiceRepository,
        MockStaffRepository, ProfileRole, SalonStatus,
    };
    use chrono::{NaiveTime, TimeZone, Timelike};
    use pretty_assertions::assert_eq;

    const OWNER: i64 = 1;
    const STAFF_PROFILE: i64 = 2;
    const CUSTOMER: i64 = 3;
    const SALON: i64 = 10;
    const STAFF: i64 = 20;
    const SERVICE: i64 = 30;

    type Svc = AppointmentServiceImpl<
        MockAppointmentRepository,
        MockSalonRepository,
        MockStaffRepository,
        MockSalonServiceRepository,
    >;

    struct Mocks {
        appointments: MockAppointmentRepository,
        salons: MockSalonRepository,
        staff: MockStaffRepository,
        services: MockSalonServiceRepository,
    }

    impl Mocks {
        /// Approved salon open 00:00-23:45 UTC with one staff member and one 30 min service.
        fn new() -> Self {
            let mut salons = MockSalonRepository::new();
            salons.expect_find_by_id().returning(|_| Ok(Some(salon(SalonStatus::Approved))));
            let mut staff = MockStaffRepository::new();
            staff.expect_find_by_id().returning(|id| {
                let mut s = Staff::new(id, SALON, "Mo".into(), None);
                s.profile_id = Some(STAFF_PROFILE);
                Ok(Some(s))
            });
            let mut services = MockSalonServiceRepository::new();
            services.expect_find_by_id().returning(|id| {
                let now = Utc::now();
                Ok(Some(SalonService {
                    id,
                    salon_id: SALON,
                    global_service_id: None,
                    name: "Cut".into(),
                    category: "Hair".into(),
                    price_cents: 2500,
                    duration_minutes: 30,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                }))
            });
            Self {
                appointments: MockAppointmentRepository::new(),
                salons,
                staff,
                services,
            }
        }

        fn build(self) -> Svc {
            AppointmentServiceImpl::new(
                Arc::new(self.appointments),
                Arc::new(self.salons),
                Arc::new(self.staff),
                Arc::new(self.services),
                Arc::new(SnowflakeGenerator::new(1, 1)),
                &test_settings().booking,
            )
        }
    }

    fn salon(status: SalonStatus) -> Salon {
        let now = Utc::now();
        Salon {
            id: SALON,
            owner_id: OWNER,
            name: "Mane St".into(),
            description: None,
            address: "7 Mane St".into(),
            city: "Hull".into(),
            phone: None,
            image_url: None,
            status,
            opening_time: NaiveTime::MIN,
            closing_time: NaiveTime::from_hms_opt(23, 45, 0).unwrap(),
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A quarter-hour aligned instant at least `days` ahead, inside opening hours.
    fn slot(days: i64) -> DateTime<Utc> {
        let date = (Utc::now() + Duration::days(days)).date_naive();
        Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap())
    }

    fn appointment(status: AppointmentStatus, starts_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: 99,
            salon_id: SALON,
            staff_id: STAFF,
            service_id: SERVICE,
            customer_id: CUSTOMER,
            starts_at,
            ends_at: starts_at + Duration::minutes(30),
            status,
            price_cents: 2500,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn request(starts_at: DateTime<Utc>) -> BookAppointmentDto {
        BookAppointmentDto {
            salon_id: SALON,
            staff_id: STAFF,
            service_id: SERVICE,
            starts_at,
            notes: Some("  ".into()),
        }
    }

    fn customer() -> Actor {
        Actor::new(CUSTOMER, ProfileRole::Customer)
    }

    #[tokio::test]
    async fn test_book_snapshots_price_and_starts_pending() {
        let mut mocks = Mocks::new();
        mocks.appointments.expect_find_blocking().returning(|_, _| Ok(vec![]));
        mocks
            .appointments
            .expect_insert_if_free()
            .returning(|a| Ok(a.clone()));

        let starts_at = slot(2);
        let booked = mocks.build().book(&customer(), request(starts_at)).await.unwrap();
        assert_eq!(booked.status, AppointmentStatus::Pending);
        assert_eq!(booked.price_cents, 2500);
        assert_eq!(booked.ends_at - booked.starts_at, Duration::minutes(30));
        assert_eq!(booked.customer_id, CUSTOMER);
        assert_eq!(booked.notes, None);
    }

    #[tokio::test]
    async fn test_book_rejects_overlap() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_blocking()
            .returning(|_, _| Ok(vec![appointment(AppointmentStatus::Confirmed, slot(2) + Duration::minutes(15))]));
        mocks.appointments.expect_insert_if_free().never();

        let err = mocks.build().book(&customer(), request(slot(2))).await.unwrap_err();
        assert!(matches!(err, BookingError::Schedule(ScheduleViolation::Overlaps)));
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_book_after_staff_deactivated_is_conflict() {
        let mut mocks = Mocks::new();
        mocks.appointments.expect_find_blocking().returning(|_, _| Ok(vec![]));
        mocks.appointments.expect_insert_if_free().returning(|_| {
            Err(AppError::Conflict(
                "The staff member is no longer taking bookings".into(),
            ))
        });

        let err = mocks.build().book(&customer(), request(slot(2))).await.unwrap_err();
        assert!(
            matches!(AppError::from(err), AppError::Conflict(msg) if msg.contains("no longer taking bookings"))
        );
    }

    #[tokio::test]
    async fn test_book_rejects_misaligned_start() {
        let mut mocks = Mocks::new();
        mocks.appointments.expect_find_blocking().returning(|_, _| Ok(vec![]));

        let err = mocks
            .build()
            .book(&customer(), request(slot(2) + Duration::minutes(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Schedule(ScheduleViolation::Misaligned)));
        assert!(matches!(AppError::from(err), AppError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn test_book_requires_approved_salon() {
        let mut mocks = Mocks::new();
        mocks.salons = MockSalonRepository::new();
        mocks
            .salons
            .expect_find_by_id()
            .returning(|_| Ok(Some(salon(SalonStatus::Suspended))));

        let err = mocks.build().book(&customer(), request(slot(2))).await.unwrap_err();
        assert!(matches!(err, BookingError::SalonNotBookable));
    }

    #[tokio::test]
    async fn test_customer_cancel_respects_cutoff() {
        let mut mocks = Mocks::new();
        let soon = Utc::now() + Duration::hours(2);
        mocks
            .appointments
            .expect_find_by_id()
            .returning(move |_| Ok(Some(appointment(AppointmentStatus::Confirmed, soon))));
        mocks.appointments.expect_change_status().never();

        let err = mocks.build().cancel(&customer(), 99, None).await.unwrap_err();
        assert!(matches!(err, BookingError::CancellationWindowClosed(24)));
    }

    #[tokio::test]
    async fn test_owner_cancels_inside_cutoff() {
        let mut mocks = Mocks::new();
        let soon = Utc::now() + Duration::hours(2);
        mocks
            .appointments
            .expect_find_by_id()
            .returning(move |_| Ok(Some(appointment(AppointmentStatus::Pending, soon))));
        mocks
            .appointments
            .expect_change_status()
            .withf(|_, c| {
                c.status == AppointmentStatus::Cancelled
                    && c.expected_current == AppointmentStatus::Pending
                    && c.cancelled_by == Some(OWNER)
                    && c.cancellation_reason.as_deref() == Some("Stylist ill")
            })
            .returning(move |_, c| {
                let mut a = appointment(c.status, soon);
                a.cancelled_by = c.cancelled_by;
                Ok(a)
            });

        let owner = Actor::new(OWNER, ProfileRole::SalonOwner);
        let cancelled = mocks
            .build()
            .cancel(&owner, 99, Some("Stylist ill".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_terminal_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(Some(appointment(AppointmentStatus::Completed, slot(-1)))));

        let owner = Actor::new(OWNER, ProfileRole::SalonOwner);
        let err = mocks.build().cancel(&owner, 99, None).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_customer_cannot_confirm() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(Some(appointment(AppointmentStatus::Pending, slot(3)))));

        let err = mocks.build().confirm(&customer(), 99).await.unwrap_err();
        assert!(matches!(err, BookingError::Forbidden));
    }

    #[tokio::test]
    async fn test_unrelated_user_sees_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(Some(appointment(AppointmentStatus::Pending, slot(3)))));

        let stranger = Actor::new(404, ProfileRole::Customer);
        let err = mocks.build().cancel(&stranger, 99, None).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound("Appointment")));
    }

    #[tokio::test]
    async fn test_assigned_staff_confirms() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(Some(appointment(AppointmentStatus::Pending, slot(3)))));
        mocks
            .appointments
            .expect_change_status()
            .returning(|_, c| Ok(appointment(c.status, slot(3))));

        let staff = Actor::new(STAFF_PROFILE, ProfileRole::Staff);
        let confirmed = mocks.build().confirm(&staff, 99).await.unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_complete_before_start_conflicts() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(Some(appointment(AppointmentStatus::Confirmed, slot(3)))));

        let owner = Actor::new(OWNER, ProfileRole::SalonOwner);
        let err = mocks.build().complete(&owner, 99).await.unwrap_err();
        assert!(matches!(err, BookingError::NotStarted));
    }

    #[tokio::test]
    async fn test_availability_excludes_busy_slot() {
        let mut mocks = Mocks::new();
        let day = slot(5);
        mocks
            .appointments
            .expect_find_blocking()
            .returning(move |_, _| Ok(vec![appointment(AppointmentStatus::Pending, day)]));

        let starts = mocks
            .build()
            .availability(SALON, STAFF, SERVICE, day.date_naive())
            .await
            .unwrap();
        assert!(!starts.contains(&day));
        assert!(!starts.contains(&(day - Duration::minutes(15))));
        assert!(starts.contains(&(day + Duration::minutes(30))));
        assert!(starts.contains(&(day - Duration::minutes(30))));
        assert!(starts.iter().all(|s| s.minute() % 15 == 0));
    }

    #[tokio::test]
    async fn test_calendar_forbidden_for_customers() {
        let mut mocks = Mocks::new();
        mocks.staff.expect_find_by_profile().returning(|_| Ok(vec![]));

        let err = mocks
            .build()
            .salon_day_calendar(&customer(), SALON, slot(1).date_naive())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden));
    }

    #[tokio::test]
    async fn test_calendar_for_owner() {
        let mut mocks = Mocks::new();
        mocks
            .staff
            .expect_find_by_salon()
            .returning(|salon_id, _| Ok(vec![Staff::new(STAFF, salon_id, "Mo".into(), None)]));
        mocks.appointments.expect_list().returning(|_| Ok(vec![]));

        let owner = Actor::new(OWNER, ProfileRole::SalonOwner);
        let calendar = mocks
            .build()
            .salon_day_calendar(&owner, SALON, slot(1).date_naive())
            .await
            .unwrap();
        assert_eq!(calendar.staff.len(), 1);
        // 00:00 to 23:45 in 15 minute slots
        assert_eq!(calendar.rows.len(), 95);
        assert!(calendar.rows.iter().all(|r| r.cells.len() == 1));
    }
}
