use crate::domain::model::{Course, Lesson};
use crate::domain::ports::CourseStore;
use crate::utils::error::{ProgressError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Courses stored as pretty-printed JSON, one file per course.
#[derive(Debug, Clone)]
pub struct LocalCourseStore {
    base_path: PathBuf,
}

impl LocalCourseStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn course_path(&self, course_id: &str) -> PathBuf {
        self.base_path
            .join("courses")
            .join(format!("{}.json", course_id))
    }

    async fn write_json(&self, path: &Path, course: &Course) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(course)?;

        // 先寫暫存檔再 rename，避免寫到一半留下壞檔
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl CourseStore for LocalCourseStore {
    async fn load_course(&self, course_id: &str) -> Result<Course> {
        let path = self.course_path(course_id);
        tracing::debug!("Loading course from {}", path.display());

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProgressError::CourseNotFound {
                    course_id: course_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    async fn save_course(&self, course: &Course) -> Result<()> {
        let path = self.course_path(&course.id);
        self.write_json(&path, course).await?;
        tracing::debug!("Saved course {} to {}", course.id, path.display());
        Ok(())
    }

    async fn update_lessons(&self, course_id: &str, lessons: &[Lesson]) -> Result<()> {
        let mut course = self.load_course(course_id).await?;
        course.lessons = lessons.to_vec();
        self.save_course(&course).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Module;
    use tempfile::TempDir;

    fn course() -> Course {
        Course {
            id: "yoga-101".to_string(),
            title: "Yoga 101".to_string(),
            lessons: vec![Lesson::new("l1", "Posture", 1), Lesson::new("l2", "Breath", 2)],
            modules: vec![Module::new("m1", "Basics", vec!["l1".into(), "l2".into()])],
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = LocalCourseStore::new(dir.path());

        store.save_course(&course()).await.unwrap();
        let loaded = store.load_course("yoga-101").await.unwrap();

        assert_eq!(loaded, course());
        assert!(dir.path().join("courses/yoga-101.json").exists());
    }

    #[tokio::test]
    async fn test_missing_course_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalCourseStore::new(dir.path());

        let err = store.load_course("nope").await.unwrap_err();
        assert!(matches!(err, ProgressError::CourseNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_lessons_keeps_modules() {
        let dir = TempDir::new().unwrap();
        let store = LocalCourseStore::new(dir.path());
        store.save_course(&course()).await.unwrap();

        let mut lessons = course().lessons;
        lessons[0].is_completed = true;
        store.update_lessons("yoga-101", &lessons).await.unwrap();

        let loaded = store.load_course("yoga-101").await.unwrap();
        assert!(loaded.lessons[0].is_completed);
        assert_eq!(loaded.modules.len(), 1);
    }
}
