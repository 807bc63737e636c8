use crate::domain::ports::ReferenceStore;
use crate::error::AppError;

/// The catalog entities a session is attached to.
#[derive(Debug, Clone, Copy)]
pub struct SessionScope<'a> {
    pub course_id: &'a str,
    pub tutor_id: &'a str,
    pub chapter_id: Option<&'a str>,
    pub topic_id: Option<&'a str>,
    pub lesson_id: Option<&'a str>,
}

/// Every referenced id must resolve before any linkage rule is checked, so a
/// missing entity always surfaces as `NotFound`.
pub async fn validate_scope<S>(store: &mut S, scope: &SessionScope<'_>) -> Result<(), AppError>
where
    S: ReferenceStore + ?Sized,
{
    let course = store.find_course(scope.course_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", scope.course_id)))?;

    store.find_user(scope.tutor_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Tutor {} not found", scope.tutor_id)))?;

    let chapter = match scope.chapter_id {
        Some(id) => Some(store.find_chapter(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Chapter {} not found", id)))?),
        None => None,
    };
    let topic = match scope.topic_id {
        Some(id) => Some(store.find_topic(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {} not found", id)))?),
        None => None,
    };
    let lesson = match scope.lesson_id {
        Some(id) => Some(store.find_lesson(id).await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", id)))?),
        None => None,
    };

    if course.instructor_id != scope.tutor_id {
        return Err(AppError::Validation(format!(
            "Tutor {} is not the instructor of course {}", scope.tutor_id, course.id
        )));
    }

    if let Some(chapter) = &chapter
        && chapter.course_id != course.id {
        return Err(AppError::Validation(format!("Chapter {} does not belong to course {}", chapter.id, course.id)));
    }

    if let Some(topic) = &topic {
        if topic.course_id != course.id {
            return Err(AppError::Validation(format!("Topic {} does not belong to course {}", topic.id, course.id)));
        }
        if let (Some(chapter), Some(parent)) = (&chapter, &topic.chapter_id)
            && &chapter.id != parent {
            return Err(AppError::Validation(format!("Topic {} does not belong to chapter {}", topic.id, chapter.id)));
        }
    }

    if let Some(lesson) = &lesson {
        if lesson.course_id != course.id {
            return Err(AppError::Validation(format!("Lesson {} does not belong to course {}", lesson.id, course.id)));
        }
        if let (Some(topic), Some(parent)) = (&topic, &lesson.topic_id)
            && &topic.id != parent {
            return Err(AppError::Validation(format!("Lesson {} does not belong to topic {}", lesson.id, topic.id)));
        }
    }

    Ok(())
}
