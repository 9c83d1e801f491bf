use crate::core::initializer::initialize_lessons;
use crate::core::modules::{ensure_modules, validate_partition, ModulePartition};
use crate::core::progression::{complete_lesson, CompletionOutcome, SiblingPolicy};
use crate::domain::model::{Course, LessonState};
use crate::domain::ports::{CourseStore, Notifier};
use crate::utils::error::{ProgressError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressPolicy {
    pub module_partition: ModulePartition,
    pub sibling_policy: SiblingPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonStatus {
    pub id: String,
    pub title: String,
    pub module_id: String,
    pub state: LessonState,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub course_id: String,
    pub percent: u8,
    pub current_lesson: Option<String>,
    pub finished: bool,
    pub lessons: Vec<LessonStatus>,
}

/// Runs progression events against a course store and reports them.
pub struct ProgressEngine<S: CourseStore, N: Notifier> {
    store: S,
    notifier: N,
    policy: ProgressPolicy,
}

impl<S: CourseStore, N: Notifier> ProgressEngine<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_policy(store, notifier, ProgressPolicy::default())
    }

    pub fn with_policy(store: S, notifier: N, policy: ProgressPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Prepares a course for a learner: modules, partition check, initial
    /// lock state. Refuses to wipe existing progress unless `reset` is set.
    pub async fn enroll(&self, course_id: &str, reset: bool) -> Result<Course> {
        let mut course = self.store.load_course(course_id).await?;

        let completed = course.completed_count();
        if completed > 0 && !reset {
            return Err(ProgressError::ProgressAlreadyStarted {
                course_id: course_id.to_string(),
                completed,
            });
        }

        if ensure_modules(&mut course, self.policy.module_partition)? {
            tracing::info!("Generated {} default modules for {}", course.modules.len(), course_id);
        }
        validate_partition(&course)?;

        course.lessons = initialize_lessons(&course);
        self.store.save_course(&course).await?;

        tracing::info!(
            "Enrolled in {} ({} lessons, {} modules)",
            course_id,
            course.lessons.len(),
            course.modules.len()
        );
        Ok(course)
    }

    pub async fn complete_lesson(&self, course_id: &str, lesson_id: &str) -> Result<CompletionOutcome> {
        let mut course = self.store.load_course(course_id).await?;
        let completion = complete_lesson(&course, lesson_id, self.policy.sibling_policy)?;

        self.store.update_lessons(course_id, &completion.lessons).await?;
        course.lessons = completion.lessons;

        let notification = completion.outcome.notification(&course);
        self.notifier.notify(&notification);

        tracing::info!(
            "Completed {} in {}: {}% done",
            lesson_id,
            course_id,
            course.progress_percent()
        );
        Ok(completion.outcome)
    }

    pub async fn status(&self, course_id: &str) -> Result<CourseProgress> {
        let course = self.store.load_course(course_id).await?;

        let lessons = course
            .modules
            .iter()
            .flat_map(|m| m.lesson_ids.iter().map(move |id| (m, id)))
            .filter_map(|(m, id)| course.lesson(id).map(|l| (m, l)))
            .map(|(m, l)| LessonStatus {
                id: l.id.clone(),
                title: l.title.clone(),
                module_id: m.id.clone(),
                state: l.state(),
            })
            .collect();

        Ok(CourseProgress {
            course_id: course.id.clone(),
            percent: course.progress_percent(),
            current_lesson: course.current_lesson().map(|l| l.id.clone()),
            finished: course.is_finished(),
            lessons,
        })
    }
}
