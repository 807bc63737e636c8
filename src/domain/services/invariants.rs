use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use crate::error::AppError;

pub const MIN_DURATION_MINUTES: i32 = 5;
pub const MIN_ATTENDEES_FLOOR: i32 = 1;
pub const MAX_ATTENDEES_CEILING: i32 = 1000;
pub const MAX_WAITLIST_CAPACITY: i32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_duration_minutes: i32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self { max_duration_minutes: 480 }
    }
}

/// Whole minutes between two instants, rounded to the nearest minute.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    ((end - start).num_seconds() as f64 / 60.0).round() as i32
}

/// Completes a schedule from `start` plus `end` and/or `duration`, and checks
/// it: `end > start`, a supplied duration agrees with the interval, and the
/// duration sits inside `[MIN_DURATION_MINUTES, limits.max_duration_minutes]`.
pub fn resolve_schedule(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    duration: Option<i32>,
    limits: &SessionLimits,
) -> Result<(DateTime<Utc>, i32), AppError> {
    let end = match (end, duration) {
        (Some(end), _) => end,
        (None, Some(minutes)) => start + Duration::minutes(minutes as i64),
        (None, None) => return Err(AppError::Validation("Either end_time or duration is required".into())),
    };

    if end <= start {
        return Err(AppError::Validation("End time must be after start time".into()));
    }

    let derived = minutes_between(start, end);
    if let Some(minutes) = duration
        && minutes != derived {
        return Err(AppError::Validation(format!(
            "Duration {} does not match the {} minutes between start and end", minutes, derived
        )));
    }

    if derived < MIN_DURATION_MINUTES || derived > limits.max_duration_minutes {
        return Err(AppError::Validation(format!(
            "Duration must be between {} and {} minutes", MIN_DURATION_MINUTES, limits.max_duration_minutes
        )));
    }

    Ok((end, derived))
}

pub fn validate_capacity(max_attendees: i32, min_attendees: i32, waitlist_capacity: i32) -> Result<(), AppError> {
    if !(MIN_ATTENDEES_FLOOR..=MAX_ATTENDEES_CEILING).contains(&max_attendees) {
        return Err(AppError::Validation(format!(
            "max_attendees must be between {} and {}", MIN_ATTENDEES_FLOOR, MAX_ATTENDEES_CEILING
        )));
    }
    if !(MIN_ATTENDEES_FLOOR..=MAX_ATTENDEES_CEILING).contains(&min_attendees) {
        return Err(AppError::Validation(format!(
            "min_attendees must be between {} and {}", MIN_ATTENDEES_FLOOR, MAX_ATTENDEES_CEILING
        )));
    }
    if min_attendees > max_attendees {
        return Err(AppError::Validation("min_attendees cannot exceed max_attendees".into()));
    }
    if !(0..=MAX_WAITLIST_CAPACITY).contains(&waitlist_capacity) {
        return Err(AppError::Validation(format!(
            "waitlist_capacity must be between 0 and {}", MAX_WAITLIST_CAPACITY
        )));
    }
    Ok(())
}

pub fn validate_timezone(timezone: &str) -> Result<(), AppError> {
    timezone.parse::<Tz>()
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Unknown timezone '{}'", timezone)))
}

pub fn ensure_future_start(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if start <= now {
        return Err(AppError::Validation("Start time must be in the future".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_is_derived_from_end() {
        let limits = SessionLimits::default();
        let (end, minutes) = resolve_schedule(start(), Some(start() + Duration::minutes(90)), None, &limits).unwrap();
        assert_eq!(end, start() + Duration::minutes(90));
        assert_eq!(minutes, 90);
    }

    #[test]
    fn test_end_is_derived_from_duration() {
        let limits = SessionLimits::default();
        let (end, minutes) = resolve_schedule(start(), None, Some(45), &limits).unwrap();
        assert_eq!(end, start() + Duration::minutes(45));
        assert_eq!(minutes, 45);
    }

    #[test]
    fn test_duration_rounds_to_nearest_minute() {
        let limits = SessionLimits::default();
        let end = start() + Duration::seconds(60 * 30 + 31);
        let (_, minutes) = resolve_schedule(start(), Some(end), Some(31), &limits).unwrap();
        assert_eq!(minutes, 31);
    }

    #[test]
    fn test_schedule_rejections() {
        let limits = SessionLimits { max_duration_minutes: 120 };
        let cases = [
            (Some(start()), None),
            (Some(start() - Duration::minutes(10)), None),
            (Some(start() + Duration::minutes(60)), Some(30)),
            (Some(start() + Duration::minutes(4)), None),
            (Some(start() + Duration::minutes(121)), None),
            (None, None),
        ];
        for (end, duration) in cases {
            let err = resolve_schedule(start(), end, duration, &limits).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "end={:?} duration={:?}", end, duration);
        }
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(validate_capacity(10, 1, 0).is_ok());
        assert!(validate_capacity(1000, 1000, 100).is_ok());
        assert!(validate_capacity(3, 5, 0).is_err());
        assert!(validate_capacity(0, 0, 0).is_err());
        assert!(validate_capacity(1001, 1, 0).is_err());
        assert!(validate_capacity(10, 1, -1).is_err());
        assert!(validate_capacity(10, 1, 101).is_err());
    }

    #[test]
    fn test_timezone_must_be_iana() {
        assert!(validate_timezone("Europe/Berlin").is_ok());
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Mars/Olympus").is_err());
    }
}
