use serde::{Deserialize, Serialize};

use crate::domain::course::CourseType;
use crate::errors::DomainError;

/// Difficulty preference, inferred from the user's phrasing rather than any
/// catalog field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Accumulated course-search filter for one conversation.
///
/// Every field is independently optional; an all-unset value is valid and
/// routes the engine to its default popularity ranking. The orchestrator
/// replaces a conversation's criteria wholesale on each merge, so readers of
/// "the context at turn N" never observe a half-merged value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Criteria {
    pub course_type: Option<CourseType>,
    pub credits: Option<f64>,
    pub keywords: Vec<String>,
    pub difficulty: Option<Difficulty>,
    pub faculty: Option<String>,
    pub teacher: Option<String>,
}

impl Criteria {
    pub fn is_empty(&self) -> bool {
        self.course_type.is_none()
            && self.credits.is_none()
            && self.keywords.is_empty()
            && self.difficulty.is_none()
            && self.faculty.is_none()
            && self.teacher.is_none()
    }

    /// Adds a keyword preserving insertion order; duplicates are dropped.
    pub fn add_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return;
        }
        if !self.keywords.iter().any(|existing| existing == trimmed) {
            self.keywords.push(trimmed.to_owned());
        }
    }

    /// Field-wise merge: a delta field wins only when it is set; unset delta
    /// fields inherit the prior value. Keywords replace wholesale when the
    /// delta carries any.
    pub fn merged_with(&self, delta: &Criteria) -> Criteria {
        Criteria {
            course_type: delta.course_type.or(self.course_type),
            credits: delta.credits.or(self.credits),
            keywords: if delta.keywords.is_empty() {
                self.keywords.clone()
            } else {
                delta.keywords.clone()
            },
            difficulty: delta.difficulty.or(self.difficulty),
            faculty: delta.faculty.clone().or_else(|| self.faculty.clone()),
            teacher: delta.teacher.clone().or_else(|| self.teacher.clone()),
        }
    }

    /// Drops malformed fields in place and reports what was dropped. A bad
    /// field never aborts a turn; it just leaves the delta unset.
    pub fn sanitize(&mut self) -> Vec<DomainError> {
        let mut dropped = Vec::new();

        if let Some(credits) = self.credits {
            if !credits.is_finite() || credits <= 0.0 {
                dropped.push(DomainError::InvalidCriteria {
                    field: "credits",
                    reason: format!("must be a positive number, got {credits}"),
                });
                self.credits = None;
            }
        }

        let faculty_blank =
            self.faculty.as_deref().map(|faculty| faculty.trim().is_empty()).unwrap_or(false);
        if faculty_blank {
            dropped.push(DomainError::InvalidCriteria {
                field: "faculty",
                reason: "must not be blank".to_owned(),
            });
            self.faculty = None;
        }

        let teacher_blank =
            self.teacher.as_deref().map(|teacher| teacher.trim().is_empty()).unwrap_or(false);
        if teacher_blank {
            dropped.push(DomainError::InvalidCriteria {
                field: "teacher",
                reason: "must not be blank".to_owned(),
            });
            self.teacher = None;
        }

        if self.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
            dropped.push(DomainError::InvalidCriteria {
                field: "keywords",
                reason: "blank keyword removed".to_owned(),
            });
            self.keywords.retain(|keyword| !keyword.trim().is_empty());
        }

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::{Criteria, Difficulty};
    use crate::domain::course::CourseType;

    fn full_criteria() -> Criteria {
        Criteria {
            course_type: Some(CourseType::Elective),
            credits: Some(3.0),
            keywords: vec!["编程".to_owned(), "人工智能".to_owned()],
            difficulty: Some(Difficulty::Easy),
            faculty: Some("创新工程学院".to_owned()),
            teacher: Some("陈伟".to_owned()),
        }
    }

    #[test]
    fn merge_with_empty_delta_preserves_prior() {
        let prior = full_criteria();
        let merged = prior.merged_with(&Criteria::default());
        assert_eq!(merged, prior);
    }

    #[test]
    fn merge_with_full_delta_returns_delta() {
        let prior = Criteria {
            course_type: Some(CourseType::Compulsory),
            credits: Some(2.0),
            keywords: vec!["设计".to_owned()],
            difficulty: Some(Difficulty::Hard),
            faculty: Some("商学院".to_owned()),
            teacher: Some("周梅".to_owned()),
        };
        let delta = full_criteria();
        assert_eq!(prior.merged_with(&delta), delta);
    }

    #[test]
    fn merge_keeps_unset_fields_from_prior() {
        let prior = full_criteria();
        let delta =
            Criteria { credits: Some(2.0), ..Criteria::default() };

        let merged = prior.merged_with(&delta);
        assert_eq!(merged.credits, Some(2.0));
        assert_eq!(merged.course_type, Some(CourseType::Elective));
        assert_eq!(merged.faculty.as_deref(), Some("创新工程学院"));
        assert_eq!(merged.keywords, prior.keywords);
    }

    #[test]
    fn keywords_keep_insertion_order_and_drop_duplicates() {
        let mut criteria = Criteria::default();
        criteria.add_keyword("数据库");
        criteria.add_keyword("编程");
        criteria.add_keyword("数据库");
        criteria.add_keyword("  ");
        assert_eq!(criteria.keywords, vec!["数据库", "编程"]);
    }

    #[test]
    fn sanitize_drops_only_the_offending_field() {
        let mut criteria = full_criteria();
        criteria.credits = Some(-1.0);

        let dropped = criteria.sanitize();
        assert_eq!(dropped.len(), 1);
        assert_eq!(criteria.credits, None);
        assert_eq!(criteria.course_type, Some(CourseType::Elective));
    }

    #[test]
    fn all_unset_criteria_is_valid_and_empty() {
        let criteria = Criteria::default();
        assert!(criteria.is_empty());
        assert!(!full_criteria().is_empty());
    }
}
