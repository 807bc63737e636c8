use std::sync::Arc;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;
use crate::domain::models::{
    activity_log::{ACTION_CREATED, ACTION_UPDATED},
    live_session::{normalize_optional, LiveSession, Platform, SessionDraft, SessionPatch},
    user::Actor,
};
use crate::domain::ports::{Clock, EnrollmentRepository, LiveSessionRepository, MeetingRequest, SchedulingTx};
use crate::domain::services::{
    conflict::{detect_conflicts, ConflictCheck, TimeRange},
    dispatch::{ChangeDispatcher, ChangeEvent},
    invariants::{ensure_future_start, resolve_schedule, validate_capacity, validate_timezone, SessionLimits},
    lifecycle::Phase,
    mutability::{apply_patch, ChangeSet, PatchOutcome, SessionField},
    provisioning::ProvisionerRegistry,
    references::{validate_scope, SessionScope},
    slug::generate_unique_slug,
};
use crate::error::AppError;

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A session together with the figures derived at read time.
#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub session: LiveSession,
    pub phase: Phase,
    pub total_enrolled: i64,
    pub available_seats: i64,
}

pub struct SchedulingEngine {
    sessions: Arc<dyn LiveSessionRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    provisioners: ProvisionerRegistry,
    dispatcher: ChangeDispatcher,
    clock: Arc<dyn Clock>,
    limits: SessionLimits,
    default_platform: String,
}

impl SchedulingEngine {
    pub fn new(
        sessions: Arc<dyn LiveSessionRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        provisioners: ProvisionerRegistry,
        dispatcher: ChangeDispatcher,
        clock: Arc<dyn Clock>,
        limits: SessionLimits,
        default_platform: String,
    ) -> Self {
        Self { sessions, enrollments, provisioners, dispatcher, clock, limits, default_platform }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create_session(&self, actor: &Actor, draft: SessionDraft) -> Result<LiveSession, AppError> {
        if draft.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }

        let now = self.clock.now();
        let mut tx = self.sessions.begin().await?;

        let session = match self.create_in_tx(tx.as_mut(), &draft, now).await {
            Ok(session) => session,
            Err(e) => {
                abort(tx).await;
                return Err(e);
            }
        };
        tx.commit().await?;

        info!("Live session {} ({}) created for course {}", session.id, session.slug, session.course_id);
        self.dispatcher.publish(ChangeEvent {
            session_id: session.id.clone(),
            actor_id: actor.id.clone(),
            action: ACTION_CREATED,
            changes: Vec::new(),
            notify_worthy: Vec::new(),
            at: now,
        }).await;

        Ok(session)
    }

    async fn create_in_tx(
        &self,
        tx: &mut dyn SchedulingTx,
        draft: &SessionDraft,
        now: DateTime<Utc>,
    ) -> Result<LiveSession, AppError> {
        let title = draft.title.trim();
        let chapter_id = draft.chapter_id.as_deref().and_then(normalize_optional);
        let topic_id = draft.topic_id.as_deref().and_then(normalize_optional);
        let lesson_id = draft.lesson_id.as_deref().and_then(normalize_optional);

        validate_scope(&mut *tx, &SessionScope {
            course_id: &draft.course_id,
            tutor_id: &draft.tutor_id,
            chapter_id: chapter_id.as_deref(),
            topic_id: topic_id.as_deref(),
            lesson_id: lesson_id.as_deref(),
        }).await?;

        let (end_time, duration_minutes) = resolve_schedule(draft.start_time, draft.end_time, draft.duration, &self.limits)?;
        ensure_future_start(draft.start_time, now)?;

        let timezone = draft.timezone.as_deref()
            .and_then(normalize_optional)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        validate_timezone(&timezone)?;

        let waitlist_capacity = draft.waitlist_capacity.unwrap_or(0);
        validate_capacity(draft.max_attendees, draft.min_attendees, waitlist_capacity)?;

        let check = ConflictCheck {
            tutor_id: &draft.tutor_id,
            course_id: &draft.course_id,
            chapter_id: chapter_id.as_deref(),
            range: TimeRange::new(draft.start_time, end_time),
            exclude_session_id: None,
        };
        detect_conflicts(&mut *tx, &check).await?;

        let slug = generate_unique_slug(&mut *tx, title).await?;

        let platform_tag = draft.platform.as_deref()
            .and_then(normalize_optional)
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| self.default_platform.clone());
        let platform = Platform::from_tag(&platform_tag);

        let id = Uuid::new_v4().to_string();
        let credentials = self.provisioners.get(platform)?
            .provision(&MeetingRequest {
                session_id: &id,
                slug: &slug,
                title,
                start_time: draft.start_time,
                duration_minutes,
            })
            .await?;

        let session = LiveSession {
            id,
            slug,
            course_id: draft.course_id.clone(),
            chapter_id,
            topic_id,
            lesson_id,
            tutor_id: draft.tutor_id.clone(),
            title: title.to_string(),
            description: draft.description.as_deref().and_then(normalize_optional),
            start_time: draft.start_time,
            end_time,
            duration_minutes,
            timezone,
            max_attendees: draft.max_attendees,
            min_attendees: draft.min_attendees,
            waitlist_enabled: draft.waitlist_enabled.unwrap_or(false),
            waitlist_capacity,
            access_level: draft.access_level.unwrap_or_default().as_str().to_string(),
            requires_approval: draft.requires_approval.unwrap_or(false),
            platform: platform_tag,
            meeting_id: Some(credentials.meeting_id),
            meeting_url: Some(credentials.meeting_url),
            meeting_password: credentials.password,
            agenda: draft.agenda.as_deref().and_then(normalize_optional),
            recommended_setup: draft.recommended_setup.as_deref().and_then(normalize_optional),
            host_notes: draft.host_notes.as_deref().and_then(normalize_optional),
            recording_prefs: Json(draft.recording_prefs.clone().unwrap_or_default()),
            is_cancelled: false,
            created_at: now,
            updated_at: now,
        };

        tx.insert(&session).await
    }

    /// Applies `patch` atomically. A repeated cancel/uncancel that changes
    /// nothing returns the stored session and an empty change-set without writing.
    pub async fn update_session(&self, actor: &Actor, id: &str, patch: SessionPatch) -> Result<(LiveSession, ChangeSet), AppError> {
        let now = self.clock.now();
        let mut tx = self.sessions.begin().await?;

        let (session, changes) = match self.update_in_tx(tx.as_mut(), id, &patch, now).await {
            Ok(result) => result,
            Err(e) => {
                abort(tx).await;
                return Err(e);
            }
        };

        if changes.is_empty() {
            abort(tx).await;
            return Ok((session, changes));
        }
        tx.commit().await?;

        info!("Live session {} updated: {:?}", session.id, changes.names());
        self.dispatcher.publish(ChangeEvent {
            session_id: session.id.clone(),
            actor_id: actor.id.clone(),
            action: ACTION_UPDATED,
            changes: changes.names(),
            notify_worthy: changes.notify_worthy().iter().map(|f| f.as_str().to_string()).collect(),
            at: now,
        }).await;

        Ok((session, changes))
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn SchedulingTx,
        id: &str,
        patch: &SessionPatch,
        now: DateTime<Utc>,
    ) -> Result<(LiveSession, ChangeSet), AppError> {
        let current = tx.find_session(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Live session {} not found", id)))?;

        let phase = Phase::resolve(now, current.start_time, current.end_time, current.is_cancelled);
        let PatchOutcome { session: mut next, changes } = apply_patch(&current, patch, phase, now, &self.limits)?;
        if changes.is_empty() {
            return Ok((current, changes));
        }

        if changes.contains(SessionField::MaxAttendees) && next.max_attendees < current.max_attendees {
            self.ensure_capacity_covers_enrollments(&current.id, next.max_attendees).await?;
        }

        if changes.touches_scope() {
            validate_scope(&mut *tx, &SessionScope {
                course_id: &next.course_id,
                tutor_id: &next.tutor_id,
                chapter_id: next.chapter_id.as_deref(),
                topic_id: next.topic_id.as_deref(),
                lesson_id: next.lesson_id.as_deref(),
            }).await?;
        }

        let reinstated = changes.contains(SessionField::IsCancelled) && !next.is_cancelled;
        if changes.touches_schedule() || changes.contains(SessionField::ChapterId) || reinstated {
            let check = ConflictCheck {
                tutor_id: &next.tutor_id,
                course_id: &next.course_id,
                chapter_id: next.chapter_id.as_deref(),
                range: next.range(),
                exclude_session_id: Some(&next.id),
            };
            detect_conflicts(&mut *tx, &check).await?;
        }

        next.updated_at = now;
        let saved = tx.update(&next).await?;
        Ok((saved, changes))
    }

    /// Fails closed: if the counter cannot answer, the reduction is refused.
    async fn ensure_capacity_covers_enrollments(&self, session_id: &str, new_max: i32) -> Result<(), AppError> {
        let confirmed = self.enrollments.count_confirmed(session_id).await.map_err(|e| {
            warn!("Enrollment count unavailable for session {}: {}", session_id, e);
            AppError::Conflict("Enrollment count unavailable; max_attendees cannot be reduced right now".into())
        })?;

        if i64::from(new_max) < confirmed {
            return Err(AppError::Conflict(format!(
                "max_attendees {} is below the {} confirmed enrollments", new_max, confirmed
            )));
        }
        Ok(())
    }

    pub async fn get_session(&self, id: &str) -> Result<SessionDetail, AppError> {
        let session = self.sessions.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Live session {} not found", id)))?;

        let total_enrolled = self.enrollments.count_confirmed(&session.id).await?;
        let available_seats = (i64::from(session.max_attendees) - total_enrolled).max(0);
        let phase = self.phase_of(&session);

        Ok(SessionDetail { session, phase, total_enrolled, available_seats })
    }

    pub async fn list_course_sessions(&self, course_id: &str, include_cancelled: bool) -> Result<Vec<(LiveSession, Phase)>, AppError> {
        let sessions = self.sessions.list_by_course(course_id, include_cancelled).await?;
        Ok(sessions.into_iter().map(|s| {
            let phase = self.phase_of(&s);
            (s, phase)
        }).collect())
    }

    pub fn phase_of(&self, session: &LiveSession) -> Phase {
        Phase::resolve(self.clock.now(), session.start_time, session.end_time, session.is_cancelled)
    }
}

async fn abort(tx: Box<dyn SchedulingTx>) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback failed: {}", e);
    }
}
