//! Dashboard Service
//!
//! Aggregate figures for the admin console and the owner back office. The
//! individual counts are independent, so they are fetched concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::services::{schedule, AccessPolicy};
use crate::domain::{
    Actor, AppointmentFilter, AppointmentRepository, AppointmentSummary, ApprovalRepository,
    ProfileRepository, Salon, SalonRepository, SalonStatus, StaffRepository, TicketRepository,
    TicketStatus, TimeRange,
};
use crate::shared::error::AppError;

const TODAY_LIMIT: i64 = 500;

/// Platform-wide figures
#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub salons_by_status: Vec<StatusCount>,
    pub pending_approvals: i64,
    pub open_tickets: i64,
    pub profiles: i64,
    pub appointments_today: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: SalonStatus,
    pub count: i64,
}

/// Figures for one salon, computed in the salon's local time
#[derive(Debug, Clone, Serialize)]
pub struct OwnerDashboard {
    pub salon_id: i64,
    pub date: NaiveDate,
    pub todays_appointments: Vec<AppointmentSummary>,
    pub upcoming_count: i64,
    pub month_revenue_cents: i64,
    pub active_staff: i64,
}

/// Dashboard service trait
#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn admin_dashboard(&self, actor: &Actor) -> Result<AdminDashboard, DashboardError>;

    async fn owner_dashboard(&self, actor: &Actor, salon_id: i64) -> Result<OwnerDashboard, DashboardError>;
}

/// Dashboard service errors
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Salon not found")]
    SalonNotFound,

    #[error("Admin access required")]
    AdminOnly,

    #[error("Only the salon owner can view this dashboard")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::SalonNotFound => AppError::NotFound(e.to_string()),
            DashboardError::AdminOnly | DashboardError::Forbidden => AppError::Forbidden(e.to_string()),
            DashboardError::Store(inner) => inner,
        }
    }
}

/// DashboardService implementation
pub struct DashboardServiceImpl<S, A, T, P, D, R>
where
    S: SalonRepository,
    A: ApprovalRepository,
    T: TicketRepository,
    P: ProfileRepository,
    D: AppointmentRepository,
    R: StaffRepository,
{
    salon_repo: Arc<S>,
    approval_repo: Arc<A>,
    ticket_repo: Arc<T>,
    profile_repo: Arc<P>,
    appointment_repo: Arc<D>,
    staff_repo: Arc<R>,
}

impl<S, A, T, P, D, R> DashboardServiceImpl<S, A, T, P, D, R>
where
    S: SalonRepository,
    A: ApprovalRepository,
    T: TicketRepository,
    P: ProfileRepository,
    D: AppointmentRepository,
    R: StaffRepository,
{
    pub fn new(
        salon_repo: Arc<S>,
        approval_repo: Arc<A>,
        ticket_repo: Arc<T>,
        profile_repo: Arc<P>,
        appointment_repo: Arc<D>,
        staff_repo: Arc<R>,
    ) -> Self {
        Self {
            salon_repo,
            approval_repo,
            ticket_repo,
            profile_repo,
            appointment_repo,
            staff_repo,
        }
    }
}

/// Start of the salon-local month containing `date` up to the start of the next.
fn month_window(salon: &Salon, date: NaiveDate) -> Option<TimeRange> {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    let start = schedule::local_day(salon, first)?.start;
    let end = schedule::local_day(salon, next)?.start;
    TimeRange::new(start, end)
}

fn utc_day(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

#[async_trait]
impl<S, A, T, P, D, R> DashboardService for DashboardServiceImpl<S, A, T, P, D, R>
where
    S: SalonRepository + 'static,
    A: ApprovalRepository + 'static,
    T: TicketRepository + 'static,
    P: ProfileRepository + 'static,
    D: AppointmentRepository + 'static,
    R: StaffRepository + 'static,
{
    async fn admin_dashboard(&self, actor: &Actor) -> Result<AdminDashboard, DashboardError> {
        if !actor.is_admin() {
            return Err(DashboardError::AdminOnly);
        }
        let (day_start, day_end) = utc_day(Utc::now());

        let (salons, pending_approvals, open_tickets, profiles, appointments_today) = futures::try_join!(
            self.salon_repo.count_by_status(),
            self.approval_repo.count_pending(),
            self.ticket_repo.count_by_status(TicketStatus::Open),
            self.profile_repo.count(),
            self.appointment_repo
                .count_starting_between(None, day_start, day_end),
        )?;

        Ok(AdminDashboard {
            salons_by_status: salons
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            pending_approvals,
            open_tickets,
            profiles,
            appointments_today,
        })
    }

    async fn owner_dashboard(&self, actor: &Actor, salon_id: i64) -> Result<OwnerDashboard, DashboardError> {
        let salon = self
            .salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(DashboardError::SalonNotFound)?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(DashboardError::Forbidden);
        }

        let now = Utc::now();
        let date = schedule::local_date(&salon, now);
        let day = schedule::local_day(&salon, date)
            .ok_or_else(|| AppError::Internal("salon day out of range".into()))?;
        let month = month_window(&salon, date)
            .ok_or_else(|| AppError::Internal("salon month out of range".into()))?;

        let today_filter = AppointmentFilter {
            salon_id: Some(salon_id),
            from: Some(day.start),
            until: Some(day.end),
            limit: TODAY_LIMIT,
            ..Default::default()
        };
        // Far enough ahead to cover any booking window
        let horizon = now + Duration::days(3650);

        let (todays_appointments, upcoming_count, month_revenue_cents, active_staff) = futures::try_join!(
            self.appointment_repo.list(&today_filter),
            self.appointment_repo
                .count_starting_between(Some(salon_id), now, horizon),
            self.appointment_repo
                .completed_revenue(salon_id, month.start, month.end),
            self.staff_repo.count_active(salon_id),
        )?;

        Ok(OwnerDashboard {
            salon_id,
            date,
            todays_appointments,
            upcoming_count,
            month_revenue_cents,
            active_staff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockAppointmentRepository, MockApprovalRepository, MockProfileRepository,
        MockSalonRepository, MockStaffRepository, MockTicketRepository, ProfileRole,
    };
    use chrono::{NaiveTime, TimeZone};
    use pretty_assertions::assert_eq;

    type Service = DashboardServiceImpl<
        MockSalonRepository,
        MockApprovalRepository,
        MockTicketRepository,
        MockProfileRepository,
        MockAppointmentRepository,
        MockStaffRepository,
    >;

    struct Mocks {
        salons: MockSalonRepository,
        approvals: MockApprovalRepository,
        tickets: MockTicketRepository,
        profiles: MockProfileRepository,
        appointments: MockAppointmentRepository,
        staff: MockStaffRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                salons: MockSalonRepository::new(),
                approvals: MockApprovalRepository::new(),
                tickets: MockTicketRepository::new(),
                profiles: MockProfileRepository::new(),
                appointments: MockAppointmentRepository::new(),
                staff: MockStaffRepository::new(),
            }
        }

        fn build(self) -> Service {
            DashboardServiceImpl::new(
                Arc::new(self.salons),
                Arc::new(self.approvals),
                Arc::new(self.tickets),
                Arc::new(self.profiles),
                Arc::new(self.appointments),
                Arc::new(self.staff),
            )
        }
    }

    fn salon(offset_minutes: i32) -> Salon {
        let now = Utc::now();
        Salon {
            id: 10,
            owner_id: 7,
            name: "Fade Factory".into(),
            description: None,
            address: "1 High St".into(),
            city: "Leeds".into(),
            phone: None,
            image_url: None,
            status: SalonStatus::Approved,
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            utc_offset_minutes: offset_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_admin_dashboard_collects_counts() {
        let mut m = Mocks::new();
        m.salons.expect_count_by_status().returning(|| {
            Ok(vec![(SalonStatus::Pending, 2), (SalonStatus::Approved, 5)])
        });
        m.approvals.expect_count_pending().returning(|| Ok(3));
        m.tickets
            .expect_count_by_status()
            .withf(|s| *s == TicketStatus::Open)
            .returning(|_| Ok(4));
        m.profiles.expect_count().returning(|| Ok(120));
        m.appointments
            .expect_count_starting_between()
            .withf(|salon, from, until| salon.is_none() && *until - *from == Duration::days(1))
            .returning(|_, _, _| Ok(17));

        let dash = m
            .build()
            .admin_dashboard(&Actor::new(1, ProfileRole::Admin))
            .await
            .unwrap();
        assert_eq!(dash.salons_by_status.len(), 2);
        assert_eq!(dash.pending_approvals, 3);
        assert_eq!(dash.open_tickets, 4);
        assert_eq!(dash.profiles, 120);
        assert_eq!(dash.appointments_today, 17);
    }

    #[tokio::test]
    async fn test_admin_dashboard_requires_admin() {
        let err = Mocks::new()
            .build()
            .admin_dashboard(&Actor::new(7, ProfileRole::SalonOwner))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::AdminOnly));
    }

    #[tokio::test]
    async fn test_owner_dashboard() {
        let mut m = Mocks::new();
        m.salons.expect_find_by_id().returning(|_| Ok(Some(salon(60))));
        m.appointments
            .expect_list()
            .withf(|f| f.salon_id == Some(10) && f.from.is_some() && f.until.is_some())
            .returning(|_| Ok(vec![]));
        m.appointments
            .expect_count_starting_between()
            .withf(|salon, _, _| *salon == Some(10))
            .returning(|_, _, _| Ok(6));
        m.appointments
            .expect_completed_revenue()
            .returning(|_, _, _| Ok(125_00));
        m.staff.expect_count_active().returning(|_| Ok(3));

        let dash = m
            .build()
            .owner_dashboard(&Actor::new(7, ProfileRole::SalonOwner), 10)
            .await
            .unwrap();
        assert_eq!(dash.upcoming_count, 6);
        assert_eq!(dash.month_revenue_cents, 12500);
        assert_eq!(dash.active_staff, 3);
    }

    #[tokio::test]
    async fn test_owner_dashboard_of_someone_elses_salon() {
        let mut m = Mocks::new();
        m.salons.expect_find_by_id().returning(|_| Ok(Some(salon(0))));
        m.appointments.expect_list().never();

        let err = m
            .build()
            .owner_dashboard(&Actor::new(8, ProfileRole::SalonOwner), 10)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Forbidden(_)));
    }

    #[test]
    fn test_month_window_uses_local_midnight() {
        let window = month_window(&salon(120), NaiveDate::from_ymd_opt(2025, 12, 14).unwrap()).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 11, 30, 22, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 12, 31, 22, 0, 0).unwrap());
    }
}
