//! Booking capacity rules
//!
//! Pure functions over a pre-fetched [`RuleContext`]; the caller gathers
//! the counts, this module only decides. Rules run in a fixed order so the
//! first failure is deterministic regardless of which ones would also
//! fail.

use chrono::NaiveDate;
use shared::clock::ClockInstant;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Device, User};
use shared::slot::TimeSlot;

/// Max future active reservations one member may hold.
pub const MAX_ACTIVE_RESERVATIONS: i64 = 3;
/// Bookings may start at most this many days ahead.
pub const BOOKING_WINDOW_DAYS: i64 = 21;
/// Early/overnight shifts need this much booking lead time.
pub const SHIFT_LEAD_TIME_HOURS: i64 = 24;
/// Members cannot cancel within this many hours of the shift start.
pub const CANCEL_CUTOFF_HOURS: i64 = 2;
/// Schedule updates close this many hours before the current start.
pub const UPDATE_CUTOFF_HOURS: i64 = 24;
/// No-shows can be recorded this many minutes after the scheduled start.
pub const NO_SHOW_GRACE_MINUTES: i64 = 30;

/// Everything the rules need, fetched up front.
pub struct RuleContext {
    pub now: ClockInstant,
    pub actor_is_admin: bool,
    /// The booking user's future active reservation count.
    pub future_active_count: i64,
    /// Active reservations for the device type on the candidate business
    /// date within the candidate's shift classification.
    pub shift_active_count: i64,
    /// Device type cap; `None` means uncapped.
    pub max_rental_units: Option<i32>,
}

/// The booking user must exist and be active.
pub fn check_account(user: &User) -> AppResult<()> {
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    Ok(())
}

/// The target device must be operable.
pub fn check_device(device: &Device) -> AppResult<()> {
    if !device.operability.is_reservable() {
        return Err(AppError::new(ErrorCode::DeviceUnavailable)
            .with_detail("operability", device.operability.as_str()));
    }
    Ok(())
}

/// Evaluate the capacity rules for a candidate slot.
pub fn evaluate(ctx: &RuleContext, date: NaiveDate, slot: TimeSlot) -> AppResult<()> {
    let start = slot.start_instant(date);

    if start.is_before(&ctx.now) {
        return Err(AppError::new(ErrorCode::StartInPast));
    }

    let window_end = ctx.now.add_days(BOOKING_WINDOW_DAYS);
    if start.is_after(&window_end) {
        return Err(AppError::new(ErrorCode::BookingWindowExceeded)
            .with_detail("max_days_ahead", BOOKING_WINDOW_DAYS));
    }

    if slot.shift_kind().requires_lead_time()
        && !ctx.actor_is_admin
        && ctx.now.hours_until(&start) < SHIFT_LEAD_TIME_HOURS
    {
        return Err(AppError::new(ErrorCode::LeadTimeTooShort)
            .with_detail("shift", slot.shift_kind().as_str())
            .with_detail("required_hours", SHIFT_LEAD_TIME_HOURS));
    }

    if !ctx.actor_is_admin && ctx.future_active_count >= MAX_ACTIVE_RESERVATIONS {
        return Err(AppError::new(ErrorCode::ActiveReservationLimit)
            .with_detail("max_active", MAX_ACTIVE_RESERVATIONS));
    }

    if let Some(cap) = ctx.max_rental_units {
        if ctx.shift_active_count >= cap as i64 {
            return Err(AppError::new(ErrorCode::RentalUnitCapExceeded)
                .with_detail("max_units", cap)
                .with_detail("shift", slot.shift_kind().as_str()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::DeviceOperability;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(start: u32, end: u32) -> TimeSlot {
        TimeSlot::new(start, end).unwrap()
    }

    /// now = 2025-07-26 10:00, member with no other bookings, uncapped.
    fn ctx() -> RuleContext {
        RuleContext {
            now: ClockInstant::from_wall(date(2025, 7, 26), 10, 0).unwrap(),
            actor_is_admin: false,
            future_active_count: 0,
            shift_active_count: 0,
            max_rental_units: None,
        }
    }

    fn code_of(result: AppResult<()>) -> ErrorCode {
        result.unwrap_err().code
    }

    #[test]
    fn test_regular_slot_tomorrow_passes() {
        assert!(evaluate(&ctx(), date(2025, 7, 27), slot(15, 18)).is_ok());
    }

    #[test]
    fn test_start_in_past_rejected() {
        let err = code_of(evaluate(&ctx(), date(2025, 7, 26), slot(7, 9)));
        assert_eq!(err, ErrorCode::StartInPast);

        // Yesterday's overnight tail (hour 26 = 02:00 today) is also past
        let err = code_of(evaluate(&ctx(), date(2025, 7, 25), slot(26, 29)));
        assert_eq!(err, ErrorCode::StartInPast);
    }

    #[test]
    fn test_booking_window_boundary() {
        // Exactly 21 days ahead at the same hour is allowed
        assert!(evaluate(&ctx(), date(2025, 8, 16), slot(10, 12)).is_ok());
        // One day past the window is not
        let err = code_of(evaluate(&ctx(), date(2025, 8, 17), slot(10, 12)));
        assert_eq!(err, ErrorCode::BookingWindowExceeded);
    }

    #[test]
    fn test_early_shift_needs_lead_time() {
        // 07:00 tomorrow is 21h away
        let err = code_of(evaluate(&ctx(), date(2025, 7, 27), slot(7, 9)));
        assert_eq!(err, ErrorCode::LeadTimeTooShort);
        // Two days out is fine
        assert!(evaluate(&ctx(), date(2025, 7, 28), slot(7, 9)).is_ok());
    }

    #[test]
    fn test_overnight_shift_needs_lead_time() {
        // 22:00 tonight is 12h away
        let err = code_of(evaluate(&ctx(), date(2025, 7, 26), slot(22, 26)));
        assert_eq!(err, ErrorCode::LeadTimeTooShort);
        // Tomorrow night (36h) is fine
        assert!(evaluate(&ctx(), date(2025, 7, 27), slot(22, 26)).is_ok());
    }

    #[test]
    fn test_regular_shift_exempt_from_lead_time() {
        // 15:00 today, 5h away
        assert!(evaluate(&ctx(), date(2025, 7, 26), slot(15, 17)).is_ok());
    }

    #[test]
    fn test_admin_bypasses_lead_time() {
        let ctx = RuleContext {
            actor_is_admin: true,
            ..ctx()
        };
        assert!(evaluate(&ctx, date(2025, 7, 27), slot(7, 9)).is_ok());
    }

    #[test]
    fn test_active_reservation_limit() {
        let ctx = RuleContext {
            future_active_count: MAX_ACTIVE_RESERVATIONS,
            ..ctx()
        };
        let err = code_of(evaluate(&ctx, date(2025, 7, 27), slot(15, 18)));
        assert_eq!(err, ErrorCode::ActiveReservationLimit);
    }

    #[test]
    fn test_admin_exempt_from_active_limit() {
        let ctx = RuleContext {
            actor_is_admin: true,
            future_active_count: MAX_ACTIVE_RESERVATIONS + 5,
            ..ctx()
        };
        assert!(evaluate(&ctx, date(2025, 7, 27), slot(15, 18)).is_ok());
    }

    #[test]
    fn test_rental_unit_cap() {
        let ctx = RuleContext {
            shift_active_count: 2,
            max_rental_units: Some(2),
            ..ctx()
        };
        let err = code_of(evaluate(&ctx, date(2025, 7, 27), slot(15, 18)));
        assert_eq!(err, ErrorCode::RentalUnitCapExceeded);
    }

    #[test]
    fn test_uncapped_type_ignores_shift_count() {
        let ctx = RuleContext {
            shift_active_count: 100,
            max_rental_units: None,
            ..ctx()
        };
        assert!(evaluate(&ctx, date(2025, 7, 27), slot(15, 18)).is_ok());
    }

    #[test]
    fn test_rule_order_start_in_past_wins() {
        // Everything is wrong at once; the first rule reports
        let ctx = RuleContext {
            future_active_count: 10,
            shift_active_count: 10,
            max_rental_units: Some(1),
            ..ctx()
        };
        let err = code_of(evaluate(&ctx, date(2025, 7, 26), slot(7, 9)));
        assert_eq!(err, ErrorCode::StartInPast);
    }

    #[test]
    fn test_cancel_cutoff_uses_whole_hours() {
        let start = ClockInstant::from_business(date(2025, 7, 26), 14, 0).unwrap();

        // 1h59m before start: under the cutoff
        let now = ClockInstant::from_wall(date(2025, 7, 26), 12, 1).unwrap();
        assert!(now.hours_until(&start) < CANCEL_CUTOFF_HOURS);

        // 2h01m before start: allowed
        let now = ClockInstant::from_wall(date(2025, 7, 26), 11, 59).unwrap();
        assert!(now.hours_until(&start) >= CANCEL_CUTOFF_HOURS);
    }

    #[test]
    fn test_disabled_account_rejected() {
        let user = User {
            id: Uuid::new_v4(),
            name: "m".into(),
            role: shared::models::UserRole::Member,
            is_active: false,
        };
        assert_eq!(code_of(check_account(&user)), ErrorCode::AccountDisabled);
    }

    #[test]
    fn test_inoperable_device_rejected() {
        let device = Device {
            id: Uuid::new_v4(),
            type_id: Uuid::new_v4(),
            number: "D1".into(),
            operability: DeviceOperability::Maintenance,
        };
        assert_eq!(code_of(check_device(&device)), ErrorCode::DeviceUnavailable);

        let device = Device {
            operability: DeviceOperability::InUse,
            ..device
        };
        assert!(check_device(&device).is_ok());
    }
}
