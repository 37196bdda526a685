//! Rule-based recommendation engine.
//!
//! Pure and deterministic: `(criteria, catalog) -> ranked courses`, never
//! failing on empty or partial input. Stages: validity check, hard filter,
//! soft-filter fallback, scoring, stable sort, diversification, truncation.
//! The LLM layers above translate language; every ranking decision is made
//! here.

mod filter;
mod reasons;
mod scoring;

pub use reasons::explain;

use crate::domain::course::Course;
use crate::domain::criteria::Criteria;

/// At most this many courses per reply.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Accepted deviation when the user pins a credit count.
pub const CREDITS_TOLERANCE: f64 = 0.5;

/// Diversification is skipped for result sets at or below this size.
const DIVERSIFY_THRESHOLD: usize = 3;

/// A catalog course with its computed match score and justification.
/// Computed per request, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCourse {
    pub course: Course,
    pub match_score: f64,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Ranks the catalog against the accumulated criteria.
    ///
    /// All-unset criteria route to the default rating+popularity ranking, as
    /// does a soft-filter pass that still retains nothing: the engine always
    /// has something to say when the catalog is non-empty.
    pub fn recommend(&self, criteria: &Criteria, catalog: &[Course]) -> Vec<ScoredCourse> {
        if catalog.is_empty() {
            return Vec::new();
        }

        if criteria.is_empty() {
            return self.default_recommendations(catalog);
        }

        let mut retained = filter::hard_filter(criteria, catalog);
        if retained.is_empty() {
            retained = filter::soft_filter(criteria, catalog);
        }
        if retained.is_empty() {
            return self.default_recommendations(catalog);
        }

        let mut scored: Vec<ScoredCourse> = retained
            .into_iter()
            .map(|course| ScoredCourse {
                match_score: scoring::match_score(&course, criteria),
                reason: reasons::explain(&course, criteria),
                course,
            })
            .collect();
        sort_by_score(&mut scored);

        // A faculty or teacher request asks for concentration in that slice;
        // diversifying would fight the user.
        let concentrated = criteria.faculty.is_some() || criteria.teacher.is_some();
        let mut ranked = if concentrated { scored } else { diversify(scored) };
        ranked.truncate(MAX_RECOMMENDATIONS);
        ranked
    }

    fn default_recommendations(&self, catalog: &[Course]) -> Vec<ScoredCourse> {
        let empty = Criteria::default();
        let mut scored: Vec<ScoredCourse> = catalog
            .iter()
            .map(|course| ScoredCourse {
                match_score: scoring::default_score(course),
                reason: reasons::explain(course, &empty),
                course: course.clone(),
            })
            .collect();
        sort_by_score(&mut scored);
        scored.truncate(MAX_RECOMMENDATIONS);
        scored
    }
}

/// Stable descending sort; equal scores keep catalog order so identical
/// inputs always reproduce identical output.
fn sort_by_score(scored: &mut [ScoredCourse]) {
    scored.sort_by(|a, b| {
        b.match_score.partial_cmp(&a.match_score).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Two-pass diversification. The first pass greedily picks courses whose
/// teacher and faculty are both unseen; the second fills remaining slots from
/// the sorted list in score order. The refill intentionally re-biases toward
/// the top scorer's teacher/faculty when the first pass under-fills.
fn diversify(sorted: Vec<ScoredCourse>) -> Vec<ScoredCourse> {
    if sorted.len() <= DIVERSIFY_THRESHOLD {
        return sorted;
    }

    let mut picked: Vec<ScoredCourse> = Vec::with_capacity(MAX_RECOMMENDATIONS);
    let mut seen_teachers: Vec<String> = Vec::new();
    let mut seen_faculties: Vec<String> = Vec::new();

    for candidate in &sorted {
        if picked.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        let teacher_seen = seen_teachers.contains(&candidate.course.teacher_name);
        let faculty_seen = seen_faculties.contains(&candidate.course.faculty_name);
        if !teacher_seen && !faculty_seen {
            seen_teachers.push(candidate.course.teacher_name.clone());
            seen_faculties.push(candidate.course.faculty_name.clone());
            picked.push(candidate.clone());
        }
    }

    for candidate in sorted {
        if picked.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        if !picked.iter().any(|existing| existing.course.id == candidate.course.id) {
            picked.push(candidate);
        }
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::{RecommendationEngine, MAX_RECOMMENDATIONS};
    use crate::domain::course::{Course, CourseType};
    use crate::domain::criteria::Criteria;

    fn course(
        id: i64,
        name: &str,
        course_type: CourseType,
        credits: f64,
        faculty: &str,
        teacher: &str,
        rating: Option<f64>,
        reviews: Option<u32>,
    ) -> Course {
        Course {
            id,
            code: format!("C{id:03}"),
            name: name.to_owned(),
            credits,
            course_type,
            faculty_name: faculty.to_owned(),
            teacher_name: teacher.to_owned(),
            description: String::new(),
            average_rating: rating,
            review_count: reviews,
        }
    }

    fn catalog() -> Vec<Course> {
        vec![
            course(1, "程序设计基础", CourseType::Compulsory, 3.0, "创新工程学院", "陈伟", Some(4.6), Some(50)),
            course(2, "机器学习", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.4), Some(35)),
            course(3, "财务管理", CourseType::Compulsory, 3.0, "商学院", "黄建华", Some(4.1), Some(28)),
            course(4, "市场营销", CourseType::Elective, 2.0, "商学院", "周梅", Some(3.9), Some(22)),
            course(5, "艺术设计概论", CourseType::Elective, 2.0, "人文艺术学院", "王艺琳", Some(4.3), Some(17)),
            course(6, "旅游经济学", CourseType::Elective, 3.0, "酒店与旅游管理学院", "李强", Some(3.7), Some(9)),
            course(7, "临床药理学", CourseType::Compulsory, 4.0, "医学院", "孙丽丽", Some(4.0), Some(41)),
        ]
    }

    #[test]
    fn empty_criteria_yields_default_ranking_without_panic() {
        let engine = RecommendationEngine::new();
        let ranked = engine.recommend(&Criteria::default(), &catalog());
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= MAX_RECOMMENDATIONS);
        for pair in ranked.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
        }
    }

    #[test]
    fn empty_catalog_yields_empty_result() {
        let engine = RecommendationEngine::new();
        assert!(engine.recommend(&Criteria::default(), &[]).is_empty());
        let criteria = Criteria { credits: Some(3.0), ..Criteria::default() };
        assert!(engine.recommend(&criteria, &[]).is_empty());
    }

    #[test]
    fn hard_filtered_results_match_requested_type_exactly() {
        let engine = RecommendationEngine::new();
        let criteria =
            Criteria { course_type: Some(CourseType::Elective), ..Criteria::default() };
        let ranked = engine.recommend(&criteria, &catalog());
        assert!(!ranked.is_empty());
        for scored in &ranked {
            assert_eq!(scored.course.course_type, CourseType::Elective);
        }
    }

    #[test]
    fn recommend_is_deterministic_for_identical_input() {
        let engine = RecommendationEngine::new();
        let criteria = Criteria { credits: Some(3.0), ..Criteria::default() };
        let first = engine.recommend(&criteria, &catalog());
        let second = engine.recommend(&criteria, &catalog());
        assert_eq!(first, second);
    }

    #[test]
    fn equal_scores_keep_catalog_order() {
        // Identical courses except id: every sub-score ties, so the stable
        // sort must preserve catalog order.
        let engine = RecommendationEngine::new();
        let twins: Vec<Course> = (1..=4)
            .map(|id| course(id, "同分课程", CourseType::Elective, 3.0, "商学院", "周梅", Some(4.0), Some(10)))
            .collect();
        let criteria = Criteria { credits: Some(3.0), ..Criteria::default() };
        let ranked = engine.recommend(&criteria, &twins);
        let ids: Vec<i64> = ranked.iter().map(|scored| scored.course.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn diversification_avoids_repeated_teachers_in_first_pass() {
        let engine = RecommendationEngine::new();
        // Six elective candidates across four teachers/faculties; the top two
        // scorers share a teacher, so a naive top-5 would double up.
        let crowded = vec![
            course(1, "机器学习", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.8), Some(60)),
            course(2, "深度学习", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.7), Some(55)),
            course(3, "市场营销", CourseType::Elective, 3.0, "商学院", "周梅", Some(4.2), Some(30)),
            course(4, "艺术设计概论", CourseType::Elective, 3.0, "人文艺术学院", "王艺琳", Some(4.1), Some(25)),
            course(5, "旅游经济学", CourseType::Elective, 3.0, "酒店与旅游管理学院", "李强", Some(3.9), Some(20)),
            course(6, "文化研究", CourseType::Elective, 3.0, "人文艺术学院", "刘芳", Some(3.8), Some(15)),
        ];
        let criteria =
            Criteria { course_type: Some(CourseType::Elective), ..Criteria::default() };

        let ranked = engine.recommend(&criteria, &crowded);
        // Four distinct teacher/faculty slots exist, so the first four picks
        // must all differ; the refill pass then re-admits the runner-up.
        let teachers: Vec<&str> =
            ranked.iter().take(4).map(|scored| scored.course.teacher_name.as_str()).collect();
        let distinct: std::collections::HashSet<&str> = teachers.iter().copied().collect();
        assert_eq!(teachers.len(), distinct.len(), "first pass repeated a teacher: {teachers:?}");
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[4].course.id, 2, "refill should re-admit the skipped runner-up");
    }

    #[test]
    fn faculty_request_skips_diversification() {
        let engine = RecommendationEngine::new();
        let concentrated = vec![
            course(1, "机器学习", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.8), Some(60)),
            course(2, "深度学习", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.7), Some(55)),
            course(3, "软件工程", CourseType::Elective, 3.0, "创新工程学院", "林晓明", Some(4.5), Some(50)),
            course(4, "数据库系统", CourseType::Elective, 3.0, "创新工程学院", "林晓明", Some(4.4), Some(45)),
            course(5, "算法设计", CourseType::Elective, 3.0, "创新工程学院", "陈伟", Some(4.3), Some(40)),
        ];
        let criteria = Criteria { faculty: Some("创新工程学院".to_owned()), ..Criteria::default() };

        let ranked = engine.recommend(&criteria, &concentrated);
        let ids: Vec<i64> = ranked.iter().map(|scored| scored.course.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5], "score order untouched for a concentrated request");
    }

    #[test]
    fn elective_three_credit_scenario_scores_above_eighty() {
        let engine = RecommendationEngine::new();
        let single = vec![course(
            9,
            "创意写作",
            CourseType::Elective,
            3.0,
            "人文艺术学院",
            "刘芳",
            Some(4.6),
            Some(40),
        )];
        let criteria = Criteria {
            credits: Some(3.0),
            course_type: Some(CourseType::Elective),
            ..Criteria::default()
        };

        let ranked = engine.recommend(&criteria, &single);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].course.id, 9);
        assert!(ranked[0].match_score > 80.0, "got {}", ranked[0].match_score);
    }

    #[test]
    fn soft_filter_rescues_description_keyword_match() {
        let engine = RecommendationEngine::new();
        let mut rescue = course(3, "跨学科导论", CourseType::Compulsory, 2.0, "商学院", "黄建华", Some(4.0), Some(12));
        rescue.description = "本课程介绍人工智能在商业中的应用".to_owned();
        let catalog = vec![
            course(1, "财务管理", CourseType::Compulsory, 3.0, "商学院", "黄建华", Some(4.1), Some(28)),
            rescue,
        ];
        let criteria = Criteria {
            faculty: Some("创新工程学院".to_owned()),
            keywords: vec!["人工智能".to_owned()],
            ..Criteria::default()
        };

        let ranked = engine.recommend(&criteria, &catalog);
        assert!(!ranked.is_empty(), "soft filter must retain the keyword match");
        assert_eq!(ranked[0].course.id, 3);
    }

    #[test]
    fn unmatchable_criteria_fall_back_to_default_ranking() {
        let engine = RecommendationEngine::new();
        let criteria = Criteria { teacher: Some("不存在的老师".to_owned()), ..Criteria::default() };
        let ranked = engine.recommend(&criteria, &catalog());
        assert!(!ranked.is_empty(), "engine always answers on a non-empty catalog");
    }
}
