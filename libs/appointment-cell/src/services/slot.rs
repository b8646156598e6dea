// libs/appointment-cell/src/services/slot.rs
//
// Interval arithmetic for a single schedule day. Everything here is pure: callers load
// the schedule day and the existing appointments, these functions only decide.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, ScheduleDay};

/// Absolute `[start, end)` of a slot on a concrete date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SlotWindow {
    /// Fails with `InvalidTime` when the interval pushes the end out of the representable range.
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        interval_minutes: i64,
    ) -> Result<Self, AppointmentError> {
        let start = date.and_time(start_time);
        let end = Duration::try_minutes(interval_minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                AppointmentError::InvalidTime(format!(
                    "Appointment interval of {} minutes is out of range",
                    interval_minutes
                ))
            })?;

        Ok(Self { start, end })
    }

    /// Half-open intersection: touching endpoints do not overlap.
    pub fn overlaps(&self, other_start: NaiveDateTime, other_end: NaiveDateTime) -> bool {
        self.start < other_end && self.end > other_start
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end.time()
    }
}

/// Combine the day's date with the requested start and derive the end from the interval.
pub fn compute_window(
    schedule_day: &ScheduleDay,
    interval_minutes: i64,
    requested_start: NaiveTime,
) -> Result<SlotWindow, AppointmentError> {
    if interval_minutes <= 0 {
        return Err(AppointmentError::InvalidTime(format!(
            "Schedule appointment interval must be positive, got {} minutes",
            interval_minutes
        )));
    }

    SlotWindow::new(schedule_day.date, requested_start, interval_minutes)
}

pub fn ensure_within_working_hours(
    window: &SlotWindow,
    schedule_day: &ScheduleDay,
    interval_minutes: i64,
) -> Result<(), AppointmentError> {
    let working_day_start = schedule_day.date.and_time(schedule_day.work_start_time);
    let working_day_end = schedule_day.date.and_time(schedule_day.work_end_time);

    if window.start < working_day_start || window.end > working_day_end {
        warn!(
            "Slot {} ({} min) outside working hours {}-{} on {}",
            window.start.time(),
            interval_minutes,
            schedule_day.work_start_time,
            schedule_day.work_end_time,
            schedule_day.date
        );
        return Err(AppointmentError::InvalidTime(format!(
            "Selected time from {} for {}-minute appointment is outside working hours ({}-{})",
            window.start.time(),
            interval_minutes,
            schedule_day.work_start_time,
            schedule_day.work_end_time
        )));
    }

    Ok(())
}

pub fn check_break_overlap(
    schedule_day: &ScheduleDay,
    window: &SlotWindow,
) -> Result<(), AppointmentError> {
    let Some((break_start, break_end)) = schedule_day.break_window() else {
        return Ok(());
    };

    let break_start = schedule_day.date.and_time(break_start);
    let break_end = schedule_day.date.and_time(break_end);

    if window.overlaps(break_start, break_end) {
        return Err(AppointmentError::InvalidTime(
            "The appointment cannot overlap with the break time".to_string(),
        ));
    }

    Ok(())
}

/// Fails on the first non-cancelled appointment (other than `exclude_appointment_id`)
/// whose slot intersects `window`.
pub fn check_overlap(
    window: &SlotWindow,
    existing_appointments: &[Appointment],
    schedule_date: NaiveDate,
    interval_minutes: i64,
    exclude_appointment_id: Option<i64>,
) -> Result<(), AppointmentError> {
    let candidates = existing_appointments
        .iter()
        .filter(|existing| Some(existing.id) != exclude_appointment_id)
        .filter(|existing| existing.status != AppointmentStatus::Cancelled);

    for existing in candidates {
        let existing_window = SlotWindow::new(schedule_date, existing.time, interval_minutes)?;
        if window.overlaps(existing_window.start, existing_window.end) {
            warn!(
                "Slot {}-{} conflicts with appointment {} at {}",
                window.start, window.end, existing.id, existing.time
            );
            return Err(AppointmentError::Overlapping);
        }
    }

    debug!(
        "No conflicts for slot {}-{} among {} appointments",
        window.start,
        window.end,
        existing_appointments.len()
    );
    Ok(())
}

/// Window computation followed by the working-hours and break checks.
pub fn validate_window(
    schedule_day: &ScheduleDay,
    interval_minutes: i64,
    requested_start: NaiveTime,
) -> Result<SlotWindow, AppointmentError> {
    let window = compute_window(schedule_day, interval_minutes, requested_start)?;
    ensure_within_working_hours(&window, schedule_day, interval_minutes)?;
    check_break_overlap(schedule_day, &window)?;
    Ok(window)
}
