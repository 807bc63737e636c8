use chrono::{DateTime, Utc};
use tracing::warn;
use crate::domain::models::live_session::LiveSession;
use crate::domain::ports::SessionStore;
use crate::error::AppError;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Touching ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A proposed placement to test against existing sessions.
#[derive(Debug, Clone)]
pub struct ConflictCheck<'a> {
    pub tutor_id: &'a str,
    pub course_id: &'a str,
    pub chapter_id: Option<&'a str>,
    pub range: TimeRange,
    /// The session being edited, which must not conflict with itself.
    pub exclude_session_id: Option<&'a str>,
}

pub async fn detect_conflicts<S>(store: &mut S, check: &ConflictCheck<'_>) -> Result<(), AppError>
where
    S: SessionStore + ?Sized,
{
    let tutor_sessions = store.find_tutor_overlaps(check.tutor_id, &check.range).await?;
    if let Some(existing) = first_clash(&tutor_sessions, check) {
        warn!("Tutor {} double-booked: proposed range overlaps session {}", check.tutor_id, existing.id);
        return Err(AppError::Conflict(format!(
            "tutor double-booked: overlaps '{}' ({} - {})",
            existing.slug, existing.start_time.to_rfc3339(), existing.end_time.to_rfc3339()
        )));
    }

    if let Some(chapter_id) = check.chapter_id {
        let chapter_sessions = store.find_chapter_overlaps(check.course_id, chapter_id, &check.range).await?;
        if let Some(existing) = first_clash(&chapter_sessions, check) {
            warn!("Chapter {} already scheduled: proposed range overlaps session {}", chapter_id, existing.id);
            return Err(AppError::Conflict(format!(
                "chapter already scheduled: overlaps '{}' ({} - {})",
                existing.slug, existing.start_time.to_rfc3339(), existing.end_time.to_rfc3339()
            )));
        }
    }

    Ok(())
}

fn first_clash<'s>(candidates: &'s [LiveSession], check: &ConflictCheck<'_>) -> Option<&'s LiveSession> {
    candidates.iter().find(|s| {
        !s.is_cancelled
            && Some(s.id.as_str()) != check.exclude_session_id
            && s.range().overlaps(&check.range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let ranges = [
            TimeRange::new(at(14, 0), at(15, 0)),
            TimeRange::new(at(14, 30), at(15, 30)),
            TimeRange::new(at(15, 0), at(16, 0)),
            TimeRange::new(at(13, 0), at(17, 0)),
            TimeRange::new(at(9, 0), at(10, 0)),
        ];
        for a in &ranges {
            for b in &ranges {
                assert_eq!(a.overlaps(b), b.overlaps(a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_back_to_back_ranges_do_not_overlap() {
        let first = TimeRange::new(at(14, 0), at(15, 0));
        let second = TimeRange::new(at(15, 0), at(16, 0));
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_partial_and_contained_ranges_overlap() {
        let base = TimeRange::new(at(14, 0), at(15, 0));
        assert!(base.overlaps(&TimeRange::new(at(14, 30), at(15, 30))));
        assert!(base.overlaps(&TimeRange::new(at(14, 15), at(14, 45))));
        assert!(base.overlaps(&TimeRange::new(at(13, 0), at(17, 0))));
        assert!(base.overlaps(&base));
        assert!(!base.overlaps(&TimeRange::new(at(15, 0) + Duration::seconds(1), at(16, 0))));
    }
}
