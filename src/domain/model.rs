use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playable audio lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonState {
    Locked,
    Unlocked,
    Completed,
}

impl Lesson {
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            duration_seconds: 0,
            is_locked: true,
            is_completed: false,
        }
    }

    pub fn state(&self) -> LessonState {
        if self.is_completed {
            LessonState::Completed
        } else if self.is_locked {
            LessonState::Locked
        } else {
            LessonState::Unlocked
        }
    }
}

/// Ordered group of lessons; the unit of unlock granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    pub lesson_ids: Vec<String>,
}

impl Module {
    pub fn new(id: impl Into<String>, title: impl Into<String>, lesson_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lesson_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Course {
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Returns the index of the module holding `lesson_id`.
    pub fn module_of(&self, lesson_id: &str) -> Option<usize> {
        self.modules
            .iter()
            .position(|m| m.lesson_ids.iter().any(|id| id == lesson_id))
    }

    pub fn completed_count(&self) -> usize {
        self.lessons.iter().filter(|l| l.is_completed).count()
    }

    pub fn progress_percent(&self) -> u8 {
        if self.lessons.is_empty() {
            return 0;
        }
        (self.completed_count() * 100 / self.lessons.len()) as u8
    }

    /// First unlocked, incomplete lesson in module order.
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|m| m.lesson_ids.iter())
            .filter_map(|id| self.lesson(id))
            .find(|l| l.state() == LessonState::Unlocked)
    }

    pub fn is_finished(&self) -> bool {
        !self.lessons.is_empty() && self.lessons.iter().all(|l| l.is_completed)
    }
}

/// Cached outcome of a remote verification lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub subject: String,
    pub verified: bool,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Toast-style message for the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}
