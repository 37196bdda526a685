//! Human-readable justification for a recommended course.
//!
//! Reason text never feeds back into scoring. Clause order is fixed: faculty
//! match, teacher match, high rating, keyword overlap, popularity.

use crate::domain::course::Course;
use crate::domain::criteria::Criteria;
use crate::engine::filter::{matched_keywords, names_overlap};

const HIGH_RATING_THRESHOLD: f64 = 4.0;
const POPULAR_REVIEW_COUNT: u32 = 10;

pub fn explain(course: &Course, criteria: &Criteria) -> String {
    let mut clauses = Vec::new();

    if let Some(faculty) = &criteria.faculty {
        if names_overlap(&course.faculty_name, faculty) {
            clauses.push(format!("来自{}", course.faculty_name));
        }
    }

    if let Some(teacher) = &criteria.teacher {
        if names_overlap(&course.teacher_name, teacher) {
            clauses.push(format!("由您指定的{}老师授课", course.teacher_name));
        }
    }

    if let Some(rating) = course.average_rating {
        if rating >= HIGH_RATING_THRESHOLD {
            clauses.push(format!("评分{rating:.1}分，学生评价优秀"));
        }
    }

    let matched = matched_keywords(course, &criteria.keywords);
    if !matched.is_empty() {
        clauses.push(format!("与您感兴趣的{}相关", matched.join("、")));
    }

    if let Some(count) = course.review_count {
        if count >= POPULAR_REVIEW_COUNT {
            clauses.push(format!("已有{count}位同学评价"));
        }
    }

    if clauses.is_empty() {
        "符合您的基本要求".to_owned()
    } else {
        clauses.join("，")
    }
}
