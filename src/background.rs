use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::job::{Job, JOB_SESSION_CHANGED};
use crate::domain::models::notification::SessionNotification;
use crate::error::AppError;

const JOB_BATCH_SIZE: i32 = 10;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    loop {
        process_pending_jobs(&state).await;
        sleep(Duration::from_secs(5)).await;
    }
}

/// Claims one batch of due jobs and runs each to COMPLETED or FAILED.
/// Returns how many jobs were claimed.
pub async fn process_pending_jobs(state: &Arc<AppState>) -> usize {
    let jobs = match state.job_repo.find_pending(JOB_BATCH_SIZE).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to fetch pending jobs: {:?}", e);
            return 0;
        }
    };
    let claimed = jobs.len();

    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            session_id = %job.payload.session_id
        );

        async {
            info!("Processing job: {}", job.job_type);
            match process_job(state, &job).await {
                Ok(_) => {
                    info!("Job completed successfully");
                    if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                        error!("Failed to mark job as completed: {:?}", e);
                    }
                },
                Err(e) => {
                    let err_msg = format!("{}", e);
                    error!("Job failed with error: {}", err_msg);
                    if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                        error!("Failed to mark job as failed: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    claimed
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    if job.job_type != JOB_SESSION_CHANGED {
        return Err(AppError::InternalWithMsg(format!("Unknown job type {}", job.job_type)));
    }

    let session_id = &job.payload.session_id;
    let session = state.session_repo.find_by_id(session_id).await?
        .ok_or(AppError::NotFound(format!("Live session {} not found", session_id)))?;

    let recipients = state.enrollment_repo.list_notifiable(session_id).await?;
    if recipients.is_empty() {
        warn!("No recipients left for session {}. Skipping notification.", session_id);
        return Ok(());
    }

    for enrollment in recipients {
        let notification = SessionNotification {
            recipient: enrollment.email,
            user_id: enrollment.user_id,
            enrollment_status: enrollment.status,
            session_id: session.id.clone(),
            session_title: session.title.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            is_cancelled: session.is_cancelled,
            changes: job.payload.changes.clone(),
        };
        info!("Notifying {} about changes to session {}", notification.recipient, session.slug);
        state.notification_service.send(&notification).await?;
    }

    Ok(())
}
