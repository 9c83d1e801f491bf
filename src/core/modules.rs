use crate::domain::model::{Course, Lesson, Module};
use crate::utils::error::{ProgressError, Result};
use crate::utils::validation::find_duplicate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do with a course that arrives without modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulePartition {
    /// Split into Basics / Intermediate / Practice.
    #[default]
    Default,
    /// Reject the course.
    Required,
}

const DEFAULT_SPLIT: [(&str, &str, usize); 3] = [
    ("basics", "Basics", 2),
    ("intermediate", "Intermediate", 2),
    ("practice", "Practice", usize::MAX),
];

/// Fixed 2 / 2 / rest partition of an ordered lesson list.
///
/// Always returns three modules; trailing ones are empty when there are
/// fewer than five lessons.
pub fn default_modules(lessons: &[Lesson]) -> Vec<Module> {
    let mut remaining = lessons;
    DEFAULT_SPLIT
        .iter()
        .map(|(id, title, take)| {
            let (head, tail) = remaining.split_at((*take).min(remaining.len()));
            remaining = tail;
            Module::new(*id, *title, head.iter().map(|l| l.id.clone()).collect())
        })
        .collect()
}

/// Fills in modules according to `policy`. Returns `true` when modules
/// were generated.
pub fn ensure_modules(course: &mut Course, policy: ModulePartition) -> Result<bool> {
    if !course.modules.is_empty() {
        return Ok(false);
    }

    match policy {
        ModulePartition::Default => {
            tracing::debug!(
                "Course {} has no modules, applying default partition",
                course.id
            );
            course.modules = default_modules(&course.lessons);
            Ok(true)
        }
        ModulePartition::Required => Err(ProgressError::InvalidCourse {
            course_id: course.id.clone(),
            message: "course has no modules and module_partition is 'required'".to_string(),
        }),
    }
}

/// Every lesson in exactly one module, every module entry an existing lesson.
pub fn validate_partition(course: &Course) -> Result<()> {
    let invalid = |message: String| ProgressError::InvalidCourse {
        course_id: course.id.clone(),
        message,
    };

    if let Some(dup) = find_duplicate(course.lessons.iter().map(|l| l.id.as_str())) {
        return Err(invalid(format!("duplicate lesson id '{}'", dup)));
    }

    let module_entries = course
        .modules
        .iter()
        .flat_map(|m| m.lesson_ids.iter().map(String::as_str));
    if let Some(dup) = find_duplicate(module_entries) {
        return Err(invalid(format!("lesson '{}' appears in more than one module", dup)));
    }

    let known: HashSet<&str> = course.lessons.iter().map(|l| l.id.as_str()).collect();
    for module in &course.modules {
        if let Some(dangling) = module.lesson_ids.iter().find(|id| !known.contains(id.as_str())) {
            return Err(invalid(format!(
                "module '{}' references unknown lesson '{}'",
                module.id, dangling
            )));
        }
    }

    if let Some(orphan) = course.lessons.iter().find(|l| course.module_of(&l.id).is_none()) {
        return Err(invalid(format!("lesson '{}' is not in any module", orphan.id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lessons(n: u32) -> Vec<Lesson> {
        (1..=n)
            .map(|i| Lesson::new(format!("l{}", i), format!("Lesson {}", i), i))
            .collect()
    }

    fn course(n: u32) -> Course {
        Course {
            id: "c1".to_string(),
            title: "Breathing basics".to_string(),
            lessons: lessons(n),
            modules: vec![],
        }
    }

    #[test]
    fn test_default_modules_partition_every_length() {
        for n in 0..=9 {
            let input = lessons(n);
            let modules = default_modules(&input);

            assert_eq!(modules.len(), 3);
            let flattened: Vec<&String> = modules.iter().flat_map(|m| &m.lesson_ids).collect();
            let expected: Vec<&String> = input.iter().map(|l| &l.id).collect();
            assert_eq!(flattened, expected, "partition broken for {} lessons", n);
        }
    }

    #[test]
    fn test_default_modules_split_sizes() {
        let modules = default_modules(&lessons(7));
        assert_eq!(modules[0].title, "Basics");
        assert_eq!(modules[0].lesson_ids, vec!["l1", "l2"]);
        assert_eq!(modules[1].lesson_ids, vec!["l3", "l4"]);
        assert_eq!(modules[2].lesson_ids, vec!["l5", "l6", "l7"]);

        let short = default_modules(&lessons(3));
        assert_eq!(short[1].lesson_ids, vec!["l3"]);
        assert!(short[2].lesson_ids.is_empty());
    }

    #[test]
    fn test_ensure_modules_policies() {
        let mut generated = course(5);
        assert!(ensure_modules(&mut generated, ModulePartition::Default).unwrap());
        assert_eq!(generated.modules.len(), 3);
        assert!(!ensure_modules(&mut generated, ModulePartition::Default).unwrap());

        let mut strict = course(5);
        let err = ensure_modules(&mut strict, ModulePartition::Required).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidCourse { .. }));
    }

    #[test]
    fn test_validate_partition_rejects_bad_layouts() {
        let mut ok = course(4);
        ok.modules = default_modules(&ok.lessons);
        assert!(validate_partition(&ok).is_ok());

        let mut dangling = ok.clone();
        dangling.modules[2].lesson_ids.push("ghost".to_string());
        assert!(validate_partition(&dangling).is_err());

        let mut twice = ok.clone();
        twice.modules[1].lesson_ids.push("l1".to_string());
        assert!(validate_partition(&twice).is_err());

        let mut orphan = ok.clone();
        orphan.modules[1].lesson_ids.pop();
        assert!(validate_partition(&orphan).is_err());
    }
}
