pub mod engine;
pub mod initializer;
pub mod modules;
pub mod progression;
pub mod verification;

pub use crate::domain::model::{Course, Lesson, LessonState, Module, Notification, Severity};
pub use crate::domain::ports::{CourseStore, Notifier, VerificationSource};
pub use crate::utils::error::Result;
