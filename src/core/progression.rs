use crate::domain::model::{Course, Lesson, Notification, Severity};
use crate::utils::error::{ProgressError, Result};
use serde::{Deserialize, Serialize};

/// Behavior when the last lesson of a module is finished while earlier
/// lessons of that module are still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPolicy {
    /// Unlock nothing until every lesson of the module is completed.
    #[default]
    RequireAll,
    /// Move on to the next module regardless.
    UnlockNextModule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionOutcome {
    NextLesson {
        unlocked: String,
    },
    ModuleCompleted {
        module_id: String,
        unlocked: String,
    },
    /// Last lesson of the module done, siblings still open, nothing unlocked.
    Stalled {
        module_id: String,
        pending: Vec<String>,
    },
    CourseCompleted,
}

impl CompletionOutcome {
    pub fn unlocked(&self) -> Option<&str> {
        match self {
            CompletionOutcome::NextLesson { unlocked }
            | CompletionOutcome::ModuleCompleted { unlocked, .. } => Some(unlocked.as_str()),
            CompletionOutcome::Stalled { .. } | CompletionOutcome::CourseCompleted => None,
        }
    }

    pub fn notification(&self, course: &Course) -> Notification {
        let title_of = |id: &str| {
            course
                .lesson(id)
                .map(|l| l.title.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let module_title = |id: &str| {
            course
                .modules
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.title.clone())
                .unwrap_or_else(|| id.to_string())
        };

        match self {
            CompletionOutcome::NextLesson { unlocked } => Notification {
                title: "Lesson completed!".to_string(),
                description: format!("Next up: {}", title_of(unlocked.as_str())),
                severity: Severity::Success,
            },
            CompletionOutcome::ModuleCompleted { module_id, unlocked } => Notification {
                title: "Module completed!".to_string(),
                description: format!(
                    "You finished {}. {} is now unlocked.",
                    module_title(module_id.as_str()),
                    title_of(unlocked.as_str())
                ),
                severity: Severity::Success,
            },
            CompletionOutcome::Stalled { module_id, pending } => Notification {
                title: "Almost there".to_string(),
                description: format!(
                    "Finish {} to complete {}",
                    pending.iter().map(|id| title_of(id.as_str())).collect::<Vec<_>>().join(", "),
                    module_title(module_id.as_str())
                ),
                severity: Severity::Warning,
            },
            CompletionOutcome::CourseCompleted => Notification {
                title: "Course completed!".to_string(),
                description: format!("Congratulations, you finished {}", course.title),
                severity: Severity::Success,
            },
        }
    }
}

/// New lesson list plus what happened.
#[derive(Debug, Clone)]
pub struct Completion {
    pub lessons: Vec<Lesson>,
    pub outcome: CompletionOutcome,
}

/// Applies a "lesson finished" event to `course` without mutating it.
pub fn complete_lesson(course: &Course, lesson_id: &str, policy: SiblingPolicy) -> Result<Completion> {
    let not_found = || ProgressError::LessonNotFound {
        course_id: course.id.clone(),
        lesson_id: lesson_id.to_string(),
    };

    let module_idx = course.module_of(lesson_id).ok_or_else(not_found)?;
    if course.lesson(lesson_id).is_none() {
        return Err(not_found());
    }

    let module = &course.modules[module_idx];
    let position = module
        .lesson_ids
        .iter()
        .position(|id| id == lesson_id)
        .ok_or_else(not_found)?;

    let mut lessons = course.lessons.clone();
    set_flags(&mut lessons, lesson_id, |l| {
        l.is_completed = true;
        l.is_locked = false;
    });

    let outcome = if let Some(next) = module.lesson_ids.get(position + 1) {
        unlock(&mut lessons, next);
        CompletionOutcome::NextLesson {
            unlocked: next.clone(),
        }
    } else {
        let next_entry = course.modules[module_idx + 1..]
            .iter()
            .find_map(|m| m.lesson_ids.first());

        match next_entry {
            None => CompletionOutcome::CourseCompleted,
            Some(entry) => {
                let pending: Vec<String> = module
                    .lesson_ids
                    .iter()
                    .filter(|id| id.as_str() != lesson_id && !is_completed(&lessons, id))
                    .cloned()
                    .collect();

                if pending.is_empty() || policy == SiblingPolicy::UnlockNextModule {
                    unlock(&mut lessons, entry);
                    CompletionOutcome::ModuleCompleted {
                        module_id: module.id.clone(),
                        unlocked: entry.clone(),
                    }
                } else {
                    tracing::warn!(
                        "Module {} exited with {} open lesson(s), nothing unlocked",
                        module.id,
                        pending.len()
                    );
                    CompletionOutcome::Stalled {
                        module_id: module.id.clone(),
                        pending,
                    }
                }
            }
        }
    };

    tracing::debug!("Lesson {} completed in course {}: {:?}", lesson_id, course.id, outcome);
    Ok(Completion { lessons, outcome })
}

fn set_flags(lessons: &mut [Lesson], id: &str, f: impl FnOnce(&mut Lesson)) {
    if let Some(lesson) = lessons.iter_mut().find(|l| l.id == id) {
        f(lesson);
    }
}

fn unlock(lessons: &mut [Lesson], id: &str) {
    set_flags(lessons, id, |l| l.is_locked = false);
}

fn is_completed(lessons: &[Lesson], id: &str) -> bool {
    lessons.iter().any(|l| l.id == id && l.is_completed)
}
