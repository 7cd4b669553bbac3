//! Opening windows, slot grids and booking-time rules.
//!
//! Everything here is pure: callers pass in the salon, the busy ranges they
//! loaded and the current instant.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::entities::{AppointmentStatus, AppointmentSummary, Salon, Staff};
use crate::domain::value_objects::TimeRange;

/// Booking limits taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    /// Grid granularity; booking starts must sit on it
    pub slot_interval: Duration,
    /// Latest bookable start, relative to now
    pub max_advance: Duration,
}

/// Why a requested start time cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleViolation {
    #[error("Appointment must start in the future")]
    InPast,

    #[error("Appointment is too far in the future")]
    TooFarAhead,

    #[error("Appointment is outside opening hours")]
    OutsideOpeningHours,

    #[error("Start time is not on the booking grid")]
    Misaligned,

    #[error("Staff member is already booked at that time")]
    Overlaps,
}

/// Converts a salon-local date and time to UTC.
fn local_instant(salon: &Salon, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    salon
        .offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date of `instant` in the salon's local time.
pub fn local_date(salon: &Salon, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&salon.offset()).date_naive()
}

/// Local midnight to midnight, in UTC.
pub fn local_day(salon: &Salon, date: NaiveDate) -> Option<TimeRange> {
    let start = local_instant(salon, date, NaiveTime::MIN)?;
    TimeRange::starting_at(start, Duration::days(1))
}

/// Opening hours of `date` in UTC. `None` when the salon's hours are empty.
pub fn opening_window(salon: &Salon, date: NaiveDate) -> Option<TimeRange> {
    let open = local_instant(salon, date, salon.opening_time)?;
    let close = local_instant(salon, date, salon.closing_time)?;
    TimeRange::new(open, close)
}

/// Slot start instants from opening up to (excluding) closing.
pub fn slot_starts(window: &TimeRange, interval: Duration) -> Vec<DateTime<Utc>> {
    if interval <= Duration::zero() {
        return Vec::new();
    }
    let mut starts = Vec::new();
    let mut at = Some(window.start);
    while let Some(start) = at.filter(|start| *start < window.end) {
        starts.push(start);
        at = start.checked_add_signed(interval);
    }
    starts
}

/// Check a requested booking against the rules, returning its time range.
///
/// `busy` holds the staff member's slot-blocking appointments around that day.
pub fn validate_booking(
    salon: &Salon,
    starts_at: DateTime<Utc>,
    duration: Duration,
    rules: &BookingRules,
    busy: &[TimeRange],
    now: DateTime<Utc>,
) -> Result<TimeRange, ScheduleViolation> {
    if starts_at <= now {
        return Err(ScheduleViolation::InPast);
    }
    let latest = now.checked_add_signed(rules.max_advance).unwrap_or(DateTime::<Utc>::MAX_UTC);
    if starts_at > latest {
        return Err(ScheduleViolation::TooFarAhead);
    }

    let range =
        TimeRange::starting_at(starts_at, duration).ok_or(ScheduleViolation::OutsideOpeningHours)?;
    let window = opening_window(salon, local_date(salon, starts_at))
        .ok_or(ScheduleViolation::OutsideOpeningHours)?;
    if !window.contains(&range) {
        return Err(ScheduleViolation::OutsideOpeningHours);
    }

    let step = rules.slot_interval.num_seconds();
    let offset = (starts_at - window.start).num_milliseconds();
    if step <= 0 || offset % (step * 1000) != 0 {
        return Err(ScheduleViolation::Misaligned);
    }

    if busy.iter().any(|b| b.overlaps(&range)) {
        return Err(ScheduleViolation::Overlaps);
    }

    Ok(range)
}

/// Bookable starts for a service of `duration` on `date`.
pub fn available_starts(
    salon: &Salon,
    date: NaiveDate,
    duration: Duration,
    rules: &BookingRules,
    busy: &[TimeRange],
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let Some(window) = opening_window(salon, date) else {
        return Vec::new();
    };
    slot_starts(&window, rules.slot_interval)
        .into_iter()
        .filter(|start| validate_booking(salon, *start, duration, rules, busy, now).is_ok())
        .collect()
}

/// Appointment shown in a booked calendar cell.
#[derive(Debug, Clone, Serialize)]
pub struct BookedSlot {
    pub appointment_id: i64,
    pub customer_name: String,
    pub service_name: String,
    pub status: AppointmentStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// State of one staff member during one slot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridCell {
    Free,
    Booked(BookedSlot),
    Past,
}

/// One row of the day calendar; `cells` follow the order of the staff columns.
#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub starts_at: DateTime<Utc>,
    pub local_time: NaiveTime,
    pub cells: Vec<GridCell>,
}

/// Build the slot-by-staff grid for the salon's day.
///
/// A cell is booked when a non-cancelled appointment of that staff member
/// overlaps the slot; otherwise slots that have already started are past.
pub fn day_grid(
    salon: &Salon,
    date: NaiveDate,
    interval: Duration,
    staff: &[Staff],
    appointments: &[AppointmentSummary],
    now: DateTime<Utc>,
) -> Vec<GridRow> {
    let Some(window) = opening_window(salon, date) else {
        return Vec::new();
    };
    let offset = salon.offset();

    slot_starts(&window, interval)
        .into_iter()
        .filter_map(|start| {
            let slot = TimeRange::starting_at(start, interval)?;
            let cells = staff
                .iter()
                .map(|member| {
                    let booked = appointments.iter().find(|s| {
                        let a = &s.appointment;
                        a.staff_id == member.id
                            && a.status != AppointmentStatus::Cancelled
                            && a.range().overlaps(&slot)
                    });
                    match booked {
                        Some(s) => GridCell::Booked(BookedSlot {
                            appointment_id: s.appointment.id,
                            customer_name: s.customer_name.clone(),
                            service_name: s.service_name.clone(),
                            status: s.appointment.status,
                            starts_at: s.appointment.starts_at,
                            ends_at: s.appointment.ends_at,
                        }),
                        None if start <= now => GridCell::Past,
                        None => GridCell::Free,
                    }
                })
                .collect();
            Some(GridRow {
                starts_at: start,
                local_time: start.with_timezone(&offset).time(),
                cells,
            })
        })
        .collect()
}
