//! Slot availability engine.
//!
//! A pure predicate over the wall clock: given a calendar date, a candidate
//! time from the fixed daily roster, and the current instant, decide whether
//! the slot is still bookable. The engine keeps no state and knows nothing
//! about existing bookings; vet-level conflicts are enforced at submission
//! time against the remote table.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::models::{BookingRules, SlotView};

/// The fixed candidate roster: on the hour, 09:00 through 17:00.
pub fn slot_roster(rules: &BookingRules) -> Vec<NaiveTime> {
    (rules.first_slot_hour..=rules.last_slot_hour)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

/// A slot is selectable iff the combined date+time instant lies strictly
/// beyond the lead-time buffer. No selected date means nothing is selectable.
pub fn is_slot_selectable(
    date: Option<NaiveDate>,
    time: NaiveTime,
    now: DateTime<Utc>,
    rules: &BookingRules,
) -> bool {
    match date {
        Some(d) => d.and_time(time).and_utc() > now + Duration::minutes(rules.min_lead_minutes),
        None => false,
    }
}

/// Day-granularity date-picker predicate: calendar cells earlier than today
/// are disabled regardless of time-of-day.
pub fn is_date_bookable(cell: NaiveDate, today: NaiveDate) -> bool {
    cell >= today
}

/// Apply the predicate across the whole roster for one calendar date.
pub fn day_slots(date: Option<NaiveDate>, now: DateTime<Utc>, rules: &BookingRules) -> Vec<SlotView> {
    slot_roster(rules)
        .into_iter()
        .map(|time| SlotView {
            time: time.format("%H:%M").to_string(),
            selectable: is_slot_selectable(date, time, now, rules),
        })
        .collect()
}

/// Parse a roster candidate ("HH:MM") into a time of day.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}
