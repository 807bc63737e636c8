use std::collections::BTreeSet;
use std::fmt;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use crate::domain::models::live_session::{normalize_optional, LiveSession, SessionPatch};
use crate::domain::services::invariants::{
    ensure_future_start, minutes_between, resolve_schedule, validate_capacity, validate_timezone, SessionLimits,
};
use crate::domain::services::lifecycle::Phase;
use crate::error::AppError;

/// When a field may be edited, relative to the session's phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// The cancellation flag; has its own transition rules.
    Cancellation,
    /// Identity and scheduling: only while `Scheduled`.
    Scheduling,
    /// Pre-session content: while `Scheduled` or `Ongoing`.
    Content,
    /// Editable in every phase.
    HostNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionField {
    Title,
    Description,
    StartTime,
    EndTime,
    DurationMinutes,
    Timezone,
    ChapterId,
    TopicId,
    LessonId,
    MaxAttendees,
    MinAttendees,
    WaitlistEnabled,
    WaitlistCapacity,
    AccessLevel,
    RequiresApproval,
    Agenda,
    RecommendedSetup,
    RecordingPrefs,
    HostNotes,
    IsCancelled,
}

impl SessionField {
    pub fn class(&self) -> FieldClass {
        match self {
            SessionField::IsCancelled => FieldClass::Cancellation,
            SessionField::Agenda | SessionField::RecommendedSetup | SessionField::RecordingPrefs => FieldClass::Content,
            SessionField::HostNotes => FieldClass::HostNotes,
            _ => FieldClass::Scheduling,
        }
    }

    /// Changes enrolled and waitlisted participants should hear about.
    pub fn is_notify_worthy(&self) -> bool {
        matches!(
            self,
            SessionField::StartTime
                | SessionField::EndTime
                | SessionField::DurationMinutes
                | SessionField::Timezone
                | SessionField::IsCancelled
                | SessionField::MaxAttendees
                | SessionField::MinAttendees
                | SessionField::WaitlistEnabled
                | SessionField::WaitlistCapacity
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionField::Title => "title",
            SessionField::Description => "description",
            SessionField::StartTime => "start_time",
            SessionField::EndTime => "end_time",
            SessionField::DurationMinutes => "duration_minutes",
            SessionField::Timezone => "timezone",
            SessionField::ChapterId => "chapter_id",
            SessionField::TopicId => "topic_id",
            SessionField::LessonId => "lesson_id",
            SessionField::MaxAttendees => "max_attendees",
            SessionField::MinAttendees => "min_attendees",
            SessionField::WaitlistEnabled => "waitlist_enabled",
            SessionField::WaitlistCapacity => "waitlist_capacity",
            SessionField::AccessLevel => "access_level",
            SessionField::RequiresApproval => "requires_approval",
            SessionField::Agenda => "agenda",
            SessionField::RecommendedSetup => "recommended_setup",
            SessionField::RecordingPrefs => "recording_prefs",
            SessionField::HostNotes => "host_notes",
            SessionField::IsCancelled => "is_cancelled",
        }
    }
}

impl fmt::Display for SessionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names actually modified by an accepted update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeSet<SessionField>);

impl ChangeSet {
    pub fn insert(&mut self, field: SessionField) {
        self.0.insert(field);
    }

    pub fn contains(&self, field: SessionField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = SessionField> + '_ {
        self.0.iter().copied()
    }

    pub fn notify_worthy(&self) -> Vec<SessionField> {
        self.fields().filter(|f| f.is_notify_worthy()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields().map(|f| f.as_str().to_string()).collect()
    }

    pub fn touches_schedule(&self) -> bool {
        self.contains(SessionField::StartTime) || self.contains(SessionField::EndTime)
    }

    pub fn touches_scope(&self) -> bool {
        self.contains(SessionField::ChapterId) || self.contains(SessionField::TopicId) || self.contains(SessionField::LessonId)
    }
}

impl FromIterator<SessionField> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = SessionField>>(iter: I) -> Self {
        ChangeSet(iter.into_iter().collect())
    }
}

/// Result of applying a patch to a session in memory.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub session: LiveSession,
    pub changes: ChangeSet,
}

/// Applies `patch` to `current` as of `now`, enforcing which fields the
/// pre-change `phase` allows. Either every requested change is legal and is
/// returned, or the whole patch is rejected.
///
/// An empty change-set is returned only for a repeated cancel/uncancel whose
/// target state the session is already in.
pub fn apply_patch(
    current: &LiveSession,
    patch: &SessionPatch,
    phase: Phase,
    now: DateTime<Utc>,
    limits: &SessionLimits,
) -> Result<PatchOutcome, AppError> {
    if let Some(tag) = &patch.platform
        && !tag.trim().eq_ignore_ascii_case(&current.platform) {
        return Err(AppError::Validation("platform cannot be changed after creation".into()));
    }

    let (next, changes) = diff(current, patch);

    if changes.is_empty() {
        return match patch.is_cancelled {
            Some(true) if phase == Phase::Cancelled => Ok(PatchOutcome { session: next, changes }),
            Some(false) if phase == Phase::Scheduled => Ok(PatchOutcome { session: next, changes }),
            Some(_) => Err(AppError::State(format!("Cancellation state cannot be confirmed while the session is {}", phase))),
            None => Err(AppError::Validation("no changes".into())),
        };
    }

    check_phase(current, &changes, next.is_cancelled, phase, now)?;
    check_values(current, patch, &next, &changes, now, limits)?;

    Ok(PatchOutcome { session: next, changes })
}

fn diff(current: &LiveSession, patch: &SessionPatch) -> (LiveSession, ChangeSet) {
    let mut next = current.clone();
    let mut changes = ChangeSet::default();

    if let Some(title) = &patch.title {
        let title = title.trim();
        if title != next.title {
            next.title = title.to_string();
            changes.insert(SessionField::Title);
        }
    }

    set_optional(&mut next.description, patch.description.as_deref(), SessionField::Description, &mut changes);

    if patch.start_time.is_some() || patch.end_time.is_some() || patch.duration.is_some() {
        let start = patch.start_time.unwrap_or(current.start_time);
        let end = match (patch.end_time, patch.duration) {
            (Some(end), _) => end,
            (None, Some(minutes)) => start + Duration::minutes(minutes as i64),
            (None, None) => start + Duration::minutes(current.duration_minutes as i64),
        };
        next.start_time = start;
        next.end_time = end;
        next.duration_minutes = minutes_between(start, end);

        if next.start_time != current.start_time { changes.insert(SessionField::StartTime); }
        if next.end_time != current.end_time { changes.insert(SessionField::EndTime); }
        if next.duration_minutes != current.duration_minutes { changes.insert(SessionField::DurationMinutes); }
    }

    if let Some(tz) = &patch.timezone
        && tz.trim() != next.timezone {
        next.timezone = tz.trim().to_string();
        changes.insert(SessionField::Timezone);
    }

    set_optional(&mut next.chapter_id, patch.chapter_id.as_deref(), SessionField::ChapterId, &mut changes);
    set_optional(&mut next.topic_id, patch.topic_id.as_deref(), SessionField::TopicId, &mut changes);
    set_optional(&mut next.lesson_id, patch.lesson_id.as_deref(), SessionField::LessonId, &mut changes);

    set_value(&mut next.max_attendees, patch.max_attendees, SessionField::MaxAttendees, &mut changes);
    set_value(&mut next.min_attendees, patch.min_attendees, SessionField::MinAttendees, &mut changes);
    set_value(&mut next.waitlist_enabled, patch.waitlist_enabled, SessionField::WaitlistEnabled, &mut changes);
    set_value(&mut next.waitlist_capacity, patch.waitlist_capacity, SessionField::WaitlistCapacity, &mut changes);
    set_value(&mut next.access_level, patch.access_level.map(|a| a.as_str().to_string()), SessionField::AccessLevel, &mut changes);
    set_value(&mut next.requires_approval, patch.requires_approval, SessionField::RequiresApproval, &mut changes);

    set_optional(&mut next.agenda, patch.agenda.as_deref(), SessionField::Agenda, &mut changes);
    set_optional(&mut next.recommended_setup, patch.recommended_setup.as_deref(), SessionField::RecommendedSetup, &mut changes);
    set_value(&mut next.recording_prefs.0, patch.recording_prefs.clone(), SessionField::RecordingPrefs, &mut changes);

    set_optional(&mut next.host_notes, patch.host_notes.as_deref(), SessionField::HostNotes, &mut changes);

    set_value(&mut next.is_cancelled, patch.is_cancelled, SessionField::IsCancelled, &mut changes);

    (next, changes)
}

fn set_value<T: PartialEq>(slot: &mut T, value: Option<T>, field: SessionField, changes: &mut ChangeSet) {
    if let Some(value) = value
        && *slot != value {
        *slot = value;
        changes.insert(field);
    }
}

fn set_optional(slot: &mut Option<String>, value: Option<&str>, field: SessionField, changes: &mut ChangeSet) {
    set_value(slot, value.map(normalize_optional), field, changes);
}

fn check_phase(
    current: &LiveSession,
    changes: &ChangeSet,
    cancel_target: bool,
    phase: Phase,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if changes.contains(SessionField::IsCancelled) {
        if cancel_target {
            if phase != Phase::Scheduled {
                return Err(AppError::State(format!("Cannot cancel a session that is {}", phase)));
            }
            if let Some(field) = changes.fields().find(|f| f.class() == FieldClass::Scheduling) {
                return Err(AppError::State(format!(
                    "Cancellation takes precedence; {} cannot be edited in the same request", field
                )));
            }
        } else if phase != Phase::Cancelled {
            return Err(AppError::State(format!("Cannot uncancel a session that is {}", phase)));
        } else if now >= current.start_time {
            return Err(AppError::State("Cannot uncancel: the session's start time has passed".into()));
        }
    }

    for field in changes.fields() {
        let allowed = match field.class() {
            FieldClass::Cancellation | FieldClass::HostNotes => true,
            FieldClass::Scheduling => phase == Phase::Scheduled,
            FieldClass::Content => matches!(phase, Phase::Scheduled | Phase::Ongoing),
        };
        if !allowed {
            return Err(AppError::State(format!("{} cannot be changed while the session is {}", field, phase)));
        }
    }

    Ok(())
}

fn check_values(
    current: &LiveSession,
    patch: &SessionPatch,
    next: &LiveSession,
    changes: &ChangeSet,
    now: DateTime<Utc>,
    limits: &SessionLimits,
) -> Result<(), AppError> {
    if changes.contains(SessionField::Title) && next.title.is_empty() {
        return Err(AppError::Validation("Title cannot be empty".into()));
    }

    if changes.touches_schedule() || changes.contains(SessionField::DurationMinutes) {
        resolve_schedule(next.start_time, Some(next.end_time), patch.duration, limits)?;
        if next.start_time != current.start_time {
            ensure_future_start(next.start_time, now)?;
        }
    }

    if changes.contains(SessionField::Timezone) {
        validate_timezone(&next.timezone)?;
    }

    if changes.contains(SessionField::MaxAttendees)
        || changes.contains(SessionField::MinAttendees)
        || changes.contains(SessionField::WaitlistCapacity) {
        validate_capacity(next.max_attendees, next.min_attendees, next.waitlist_capacity)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::live_session::{AccessLevel, RecordingPrefs};
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use sqlx::types::Json;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap()
    }

    fn session() -> LiveSession {
        LiveSession {
            id: "s-1".into(),
            slug: "office-hours".into(),
            course_id: "c-1".into(),
            chapter_id: None,
            topic_id: None,
            lesson_id: None,
            tutor_id: "t-1".into(),
            title: "Office Hours".into(),
            description: None,
            start_time: start(),
            end_time: start() + Duration::hours(1),
            duration_minutes: 60,
            timezone: "UTC".into(),
            max_attendees: 10,
            min_attendees: 1,
            waitlist_enabled: false,
            waitlist_capacity: 0,
            access_level: AccessLevel::Enrolled.as_str().into(),
            requires_approval: false,
            platform: "jitsi".into(),
            meeting_id: Some("room".into()),
            meeting_url: Some("https://meet.jit.si/room".into()),
            meeting_password: None,
            agenda: None,
            recommended_setup: None,
            host_notes: None,
            recording_prefs: Json(RecordingPrefs::default()),
            is_cancelled: false,
            created_at: start() - Duration::days(10),
            updated_at: start() - Duration::days(10),
        }
    }

    fn before_start() -> DateTime<Utc> {
        start() - Duration::days(1)
    }

    fn apply(current: &LiveSession, patch: SessionPatch, now: DateTime<Utc>) -> Result<PatchOutcome, AppError> {
        let phase = Phase::resolve(now, current.start_time, current.end_time, current.is_cancelled);
        apply_patch(current, &patch, phase, now, &SessionLimits::default())
    }

    #[test]
    fn test_scheduling_fields_editable_only_while_scheduled() {
        let current = session();
        let patch = SessionPatch { title: Some("Renamed".into()), ..Default::default() };

        let outcome = apply(&current, patch.clone(), before_start()).unwrap();
        assert_eq!(outcome.session.title, "Renamed");
        assert!(outcome.changes.contains(SessionField::Title));

        let ongoing = start() + Duration::minutes(1);
        assert_eq!(apply(&current, patch.clone(), ongoing).unwrap_err().kind(), ErrorKind::State);

        let completed = start() + Duration::hours(2);
        assert_eq!(apply(&current, patch, completed).unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_blank_title_is_gated_by_phase_before_validation() {
        let current = session();
        let patch = SessionPatch { title: Some("   ".into()), ..Default::default() };

        let err = apply(&current, patch.clone(), start() + Duration::minutes(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);

        let err = apply(&current, patch, before_start()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_content_editable_while_ongoing_but_not_after() {
        let current = session();
        let patch = SessionPatch { agenda: Some("1. Recap".into()), ..Default::default() };

        let outcome = apply(&current, patch.clone(), start() + Duration::minutes(1)).unwrap();
        assert_eq!(outcome.session.agenda.as_deref(), Some("1. Recap"));

        let err = apply(&current, patch, start() + Duration::hours(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_content_not_editable_while_cancelled() {
        let mut current = session();
        current.is_cancelled = true;
        let patch = SessionPatch { agenda: Some("nope".into()), ..Default::default() };
        assert_eq!(apply(&current, patch, before_start()).unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_host_notes_editable_in_every_phase() {
        let mut cancelled = session();
        cancelled.is_cancelled = true;
        let patch = SessionPatch { host_notes: Some("remember slides".into()), ..Default::default() };

        for (current, now) in [
            (session(), before_start()),
            (session(), start() + Duration::minutes(10)),
            (session(), start() + Duration::hours(3)),
            (cancelled, before_start()),
        ] {
            let outcome = apply(&current, patch.clone(), now).unwrap();
            assert_eq!(outcome.session.host_notes.as_deref(), Some("remember slides"));
        }
    }

    #[test]
    fn test_cancel_only_from_scheduled() {
        let current = session();
        let cancel = SessionPatch { is_cancelled: Some(true), ..Default::default() };

        let outcome = apply(&current, cancel.clone(), before_start()).unwrap();
        assert!(outcome.session.is_cancelled);
        assert_eq!(outcome.changes.notify_worthy(), vec![SessionField::IsCancelled]);

        let err = apply(&current, cancel, start() + Duration::minutes(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_cancel_with_scheduling_edit_is_rejected() {
        let current = session();
        let patch = SessionPatch {
            is_cancelled: Some(true),
            start_time: Some(start() + Duration::hours(2)),
            ..Default::default()
        };
        assert_eq!(apply(&current, patch, before_start()).unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_uncancel_only_before_start() {
        let mut current = session();
        current.is_cancelled = true;
        let uncancel = SessionPatch { is_cancelled: Some(false), ..Default::default() };

        let outcome = apply(&current, uncancel.clone(), before_start()).unwrap();
        assert!(!outcome.session.is_cancelled);

        let err = apply(&current, uncancel, start() + Duration::minutes(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_repeated_cancel_is_idempotent() {
        let mut current = session();
        current.is_cancelled = true;
        let cancel = SessionPatch { is_cancelled: Some(true), ..Default::default() };

        let outcome = apply(&current, cancel.clone(), before_start()).unwrap();
        assert!(outcome.changes.is_empty());

        let err = apply(&current, cancel, start() + Duration::hours(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_platform_is_immutable_in_every_phase() {
        let current = session();
        let patch = SessionPatch { platform: Some("zoom".into()), ..Default::default() };
        for now in [before_start(), start() + Duration::minutes(1), start() + Duration::hours(2)] {
            assert_eq!(apply(&current, patch.clone(), now).unwrap_err().kind(), ErrorKind::Validation);
        }

        let same = SessionPatch { platform: Some("Jitsi".into()), host_notes: Some("x".into()), ..Default::default() };
        assert!(apply(&current, same, before_start()).is_ok());
    }

    #[test]
    fn test_empty_or_unchanged_patch_is_rejected() {
        let current = session();
        let err = apply(&current, SessionPatch::default(), before_start()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let same_title = SessionPatch { title: Some("Office Hours".into()), ..Default::default() };
        assert_eq!(apply(&current, same_title, before_start()).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_moving_start_keeps_duration() {
        let current = session();
        let patch = SessionPatch { start_time: Some(start() + Duration::hours(3)), ..Default::default() };
        let outcome = apply(&current, patch, before_start()).unwrap();
        assert_eq!(outcome.session.end_time, start() + Duration::hours(4));
        assert_eq!(outcome.session.duration_minutes, 60);
        assert!(outcome.changes.touches_schedule());
        assert!(!outcome.changes.contains(SessionField::DurationMinutes));
    }

    #[test]
    fn test_duration_change_moves_end() {
        let current = session();
        let patch = SessionPatch { duration: Some(90), ..Default::default() };
        let outcome = apply(&current, patch, before_start()).unwrap();
        assert_eq!(outcome.session.end_time, start() + Duration::minutes(90));
        assert!(outcome.changes.contains(SessionField::EndTime));
        assert!(outcome.changes.contains(SessionField::DurationMinutes));
    }

    #[test]
    fn test_inconsistent_duration_is_rejected() {
        let current = session();
        let patch = SessionPatch {
            end_time: Some(start() + Duration::minutes(90)),
            duration: Some(30),
            ..Default::default()
        };
        assert_eq!(apply(&current, patch, before_start()).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_min_cannot_exceed_updated_max() {
        let current = session();
        let patch = SessionPatch { max_attendees: Some(4), min_attendees: Some(5), ..Default::default() };
        assert_eq!(apply(&current, patch, before_start()).unwrap_err().kind(), ErrorKind::Validation);

        let patch = SessionPatch { max_attendees: Some(4), min_attendees: Some(4), ..Default::default() };
        assert!(apply(&current, patch, before_start()).is_ok());
    }

    #[test]
    fn test_empty_string_clears_link() {
        let mut current = session();
        current.chapter_id = Some("ch-1".into());
        let patch = SessionPatch { chapter_id: Some(String::new()), ..Default::default() };
        let outcome = apply(&current, patch, before_start()).unwrap();
        assert_eq!(outcome.session.chapter_id, None);
        assert!(outcome.changes.touches_scope());
    }

    #[test]
    fn test_access_level_change_is_not_notify_worthy() {
        let current = session();
        let patch = SessionPatch { access_level: Some(AccessLevel::Public), ..Default::default() };
        let outcome = apply(&current, patch, before_start()).unwrap();
        assert_eq!(outcome.session.access_level, "public");
        assert!(outcome.changes.notify_worthy().is_empty());
    }
}
