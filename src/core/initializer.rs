use crate::domain::model::{Course, Lesson};

/// Locks every lesson except the entry lesson of the course.
///
/// The entry lesson is the first lesson of the first non-empty module.
/// Courses without modules are returned unchanged. Running this on a course
/// with progress wipes that progress; the engine guards against it.
pub fn initialize_lessons(course: &Course) -> Vec<Lesson> {
    let Some(entry) = course
        .modules
        .iter()
        .find_map(|m| m.lesson_ids.first())
    else {
        return course.lessons.clone();
    };

    course
        .lessons
        .iter()
        .map(|lesson| Lesson {
            is_locked: lesson.id != *entry,
            is_completed: false,
            ..lesson.clone()
        })
        .collect()
}
