use crate::domain::model::{Course, Lesson, Notification};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Persistence collaborator for the course aggregate.
pub trait CourseStore: Send + Sync {
    fn load_course(
        &self,
        course_id: &str,
    ) -> impl std::future::Future<Output = Result<Course>> + Send;
    fn save_course(&self, course: &Course) -> impl std::future::Future<Output = Result<()>> + Send;
    fn update_lessons(
        &self,
        course_id: &str,
        lessons: &[Lesson],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote lookup answering "is this subject verified".
#[async_trait]
pub trait VerificationSource: Send + Sync {
    async fn is_verified(&self, subject: &str) -> Result<bool>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}
