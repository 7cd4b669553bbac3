//! Who may do what to salons and appointments.

use crate::domain::entities::{Appointment, Salon, Staff};
use crate::domain::value_objects::Actor;

/// How the caller relates to an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAccess {
    /// Salon owner or platform admin
    Manager,
    /// The staff member the appointment is assigned to
    AssignedStaff,
    /// The customer who booked it
    Customer,
    None,
}

impl AppointmentAccess {
    /// Confirm and complete are reserved for the salon side.
    pub fn can_progress(&self) -> bool {
        matches!(self, Self::Manager | Self::AssignedStaff)
    }

    /// Customers cancel subject to the cutoff; everyone else any time.
    pub fn bypasses_cutoff(&self) -> bool {
        self.can_progress()
    }

    pub fn can_view(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Domain service for authorization decisions that need entity state.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Owners manage their own salons; admins manage all of them.
    pub fn can_manage_salon(actor: &Actor, salon: &Salon) -> bool {
        actor.is_admin() || salon.is_owner(actor.profile_id)
    }

    /// Non-public salons are visible to their owner and admins only.
    pub fn can_view_salon(actor: Option<&Actor>, salon: &Salon) -> bool {
        salon.is_public() || actor.is_some_and(|a| Self::can_manage_salon(a, salon))
    }

    /// The day calendar is open to managers and to active staff of the salon.
    /// `memberships` are the caller's staff rows.
    pub fn can_view_calendar(actor: &Actor, salon: &Salon, memberships: &[Staff]) -> bool {
        Self::can_manage_salon(actor, salon)
            || memberships
                .iter()
                .any(|s| s.is_bookable_at(salon.id) && s.is_linked_to(actor.profile_id))
    }

    /// `staff` is the staff row the appointment is assigned to.
    pub fn appointment_access(
        actor: &Actor,
        appointment: &Appointment,
        salon: &Salon,
        staff: &Staff,
    ) -> AppointmentAccess {
        if Self::can_manage_salon(actor, salon) {
            AppointmentAccess::Manager
        } else if staff.id == appointment.staff_id && staff.is_linked_to(actor.profile_id) {
            AppointmentAccess::AssignedStaff
        } else if appointment.customer_id == actor.profile_id {
            AppointmentAccess::Customer
        } else {
            AppointmentAccess::None
        }
    }
}
