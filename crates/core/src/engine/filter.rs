//! Hard and soft candidate filtering.
//!
//! The hard pass keeps a course only when every set constraint holds; the
//! soft pass is the fallback when the hard pass empties out, keeping a course
//! when any one constraint holds.

use crate::domain::course::Course;
use crate::domain::criteria::Criteria;
use crate::engine::CREDITS_TOLERANCE;

/// Case-insensitive bidirectional containment. Either string may be the
/// abbreviation of the other ("创新工程学院" vs "创新学院" style mismatches).
pub(crate) fn names_overlap(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let left = left.to_lowercase();
    let right = right.to_lowercase();
    left.contains(&right) || right.contains(&left)
}

/// Composite lowercase haystack for keyword containment.
pub(crate) fn search_text(course: &Course) -> String {
    format!(
        "{} {} {} {} {}",
        course.name, course.code, course.description, course.faculty_name, course.teacher_name
    )
    .to_lowercase()
}

pub(crate) fn matched_keywords<'a>(course: &Course, keywords: &'a [String]) -> Vec<&'a str> {
    if keywords.is_empty() {
        return Vec::new();
    }
    let haystack = search_text(course);
    keywords
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .map(String::as_str)
        .collect()
}

pub(crate) fn hard_filter(criteria: &Criteria, catalog: &[Course]) -> Vec<Course> {
    catalog
        .iter()
        .filter(|course| {
            if let Some(course_type) = criteria.course_type {
                if course.course_type != course_type {
                    return false;
                }
            }

            if let Some(credits) = criteria.credits {
                if (course.credits - credits).abs() > CREDITS_TOLERANCE {
                    return false;
                }
            }

            if let Some(faculty) = &criteria.faculty {
                if !names_overlap(&course.faculty_name, faculty) {
                    return false;
                }
            }

            if let Some(teacher) = &criteria.teacher {
                if !names_overlap(&course.teacher_name, teacher) {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect()
}

pub(crate) fn soft_filter(criteria: &Criteria, catalog: &[Course]) -> Vec<Course> {
    catalog
        .iter()
        .filter(|course| {
            if let Some(faculty) = &criteria.faculty {
                if names_overlap(&course.faculty_name, faculty) {
                    return true;
                }
            }

            if let Some(teacher) = &criteria.teacher {
                if names_overlap(&course.teacher_name, teacher) {
                    return true;
                }
            }

            if criteria.course_type == Some(course.course_type) {
                return true;
            }

            !matched_keywords(course, &criteria.keywords).is_empty()
        })
        .cloned()
        .collect()
}
