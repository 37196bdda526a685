//! Match-score computation.
//!
//! A filtered course is scored as the sum of five independent sub-scores with
//! a fixed 100-point ceiling: specificity (faculty/teacher) 30, keyword
//! coverage 25, rating quality 25, popularity 10, difficulty alignment 10.
//! The default path (no criteria at all) ranks on rating and popularity only.

use crate::domain::course::Course;
use crate::domain::criteria::{Criteria, Difficulty};
use crate::engine::filter::{matched_keywords, names_overlap};

const FACULTY_BONUS: f64 = 20.0;
const TEACHER_BONUS: f64 = 10.0;

const KEYWORD_WEIGHT: f64 = 25.0;
const KEYWORD_BASELINE: f64 = 20.0;

const RATING_WEIGHT: f64 = 25.0;
const RATING_BASELINE: f64 = 10.0;
const RATING_SCALE: f64 = 5.0;

const POPULARITY_WEIGHT: f64 = 10.0;
const POPULARITY_BASELINE: f64 = 10.0 / 3.0;
const REVIEW_COUNT_CEILING: u32 = 100;

const DIFFICULTY_TOP: f64 = 10.0;
const DIFFICULTY_MID: f64 = 20.0 / 3.0;
const DIFFICULTY_LOW: f64 = 10.0 / 3.0;

const DEFAULT_RATING_WEIGHT: f64 = 60.0;
const DEFAULT_RATING_BASELINE: f64 = 30.0;
const DEFAULT_POPULARITY_WEIGHT: f64 = 40.0;
const DEFAULT_POPULARITY_BASELINE: f64 = 10.0;

pub(crate) fn match_score(course: &Course, criteria: &Criteria) -> f64 {
    specificity_score(course, criteria)
        + keyword_score(course, criteria)
        + rating_score(course)
        + popularity_score(course)
        + difficulty_score(course, criteria.difficulty)
}

/// Rating-and-popularity-only ranking used when no criteria are set.
pub(crate) fn default_score(course: &Course) -> f64 {
    let rating = match course.average_rating {
        Some(rating) => rating / RATING_SCALE * DEFAULT_RATING_WEIGHT,
        None => DEFAULT_RATING_BASELINE,
    };
    let popularity = match course.review_count {
        Some(count) => popularity_term(count) * DEFAULT_POPULARITY_WEIGHT,
        None => DEFAULT_POPULARITY_BASELINE,
    };
    rating + popularity
}

/// Faculty/teacher specificity. An unrequested dimension scores its full
/// weight (neutral within one request, like the keyword baseline); a
/// requested one scores only on a match.
fn specificity_score(course: &Course, criteria: &Criteria) -> f64 {
    let faculty = match &criteria.faculty {
        Some(faculty) if names_overlap(&course.faculty_name, faculty) => FACULTY_BONUS,
        Some(_) => 0.0,
        None => FACULTY_BONUS,
    };
    let teacher = match &criteria.teacher {
        Some(teacher) if names_overlap(&course.teacher_name, teacher) => TEACHER_BONUS,
        Some(_) => 0.0,
        None => TEACHER_BONUS,
    };
    faculty + teacher
}

fn keyword_score(course: &Course, criteria: &Criteria) -> f64 {
    if criteria.keywords.is_empty() {
        return KEYWORD_BASELINE;
    }
    let matched = matched_keywords(course, &criteria.keywords).len() as f64;
    matched / criteria.keywords.len() as f64 * KEYWORD_WEIGHT
}

fn rating_score(course: &Course) -> f64 {
    match course.average_rating {
        Some(rating) => rating / RATING_SCALE * RATING_WEIGHT,
        None => RATING_BASELINE,
    }
}

/// Log-compressed review count normalized into 0..=1, shared between the
/// filtered and default paths.
fn popularity_term(review_count: u32) -> f64 {
    let clamped = review_count.min(REVIEW_COUNT_CEILING) as f64;
    ((clamped + 1.0).log10() / 2.0).min(1.0)
}

fn popularity_score(course: &Course) -> f64 {
    match course.review_count {
        Some(count) => popularity_term(count) * POPULARITY_WEIGHT,
        None => POPULARITY_BASELINE,
    }
}

/// Rating is the only difficulty signal the catalog carries: a high rating
/// reads as approachable, a middling one as demanding.
fn difficulty_score(course: &Course, difficulty: Option<Difficulty>) -> f64 {
    let (Some(difficulty), Some(rating)) = (difficulty, course.average_rating) else {
        return DIFFICULTY_MID;
    };

    match difficulty {
        Difficulty::Easy => {
            if rating >= 4.0 {
                DIFFICULTY_TOP
            } else if rating >= 3.5 {
                DIFFICULTY_MID
            } else {
                DIFFICULTY_LOW
            }
        }
        Difficulty::Hard => {
            if (3.0..=4.0).contains(&rating) {
                DIFFICULTY_TOP
            } else {
                DIFFICULTY_MID
            }
        }
        Difficulty::Medium => {
            if (3.5..=4.5).contains(&rating) {
                DIFFICULTY_TOP
            } else {
                DIFFICULTY_MID
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{default_score, match_score};
    use crate::domain::course::{Course, CourseType};
    use crate::domain::criteria::{Criteria, Difficulty};

    fn course(rating: Option<f64>, reviews: Option<u32>) -> Course {
        Course {
            id: 1,
            code: "CS101".to_owned(),
            name: "人工智能导论".to_owned(),
            credits: 3.0,
            course_type: CourseType::Elective,
            faculty_name: "创新工程学院".to_owned(),
            teacher_name: "陈伟".to_owned(),
            description: "机器学习与算法基础".to_owned(),
            average_rating: rating,
            review_count: reviews,
        }
    }

    #[test]
    fn full_match_stays_at_or_below_ceiling() {
        let criteria = Criteria {
            course_type: Some(CourseType::Elective),
            credits: Some(3.0),
            keywords: vec!["人工智能".to_owned()],
            difficulty: Some(Difficulty::Easy),
            faculty: Some("创新工程学院".to_owned()),
            teacher: Some("陈伟".to_owned()),
        };
        let score = match_score(&course(Some(5.0), Some(200)), &criteria);
        assert!(score <= 100.0, "score {score} exceeded ceiling");
        assert!(score > 90.0, "full match should land near the ceiling, got {score}");
    }

    #[test]
    fn keyword_coverage_is_proportional() {
        let criteria_half = Criteria {
            keywords: vec!["人工智能".to_owned(), "金融".to_owned()],
            ..Criteria::default()
        };
        let criteria_full =
            Criteria { keywords: vec!["人工智能".to_owned()], ..Criteria::default() };

        let subject = course(None, None);
        let half = match_score(&subject, &criteria_half);
        let full = match_score(&subject, &criteria_full);
        assert!((full - half - 12.5).abs() < 1e-9, "expected 12.5 gap, got {}", full - half);
    }

    #[test]
    fn missing_rating_and_reviews_fall_back_to_baselines() {
        let criteria = Criteria { keywords: vec!["金融".to_owned()], ..Criteria::default() };
        let score = match_score(&course(None, None), &criteria);
        // 30 specificity baseline + 0 keyword + 10 rating baseline
        // + 10/3 popularity baseline + 20/3 difficulty mid
        assert!((score - 50.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn requested_but_unmatched_specificity_scores_zero() {
        let matched = Criteria { faculty: Some("创新工程学院".to_owned()), ..Criteria::default() };
        let unmatched = Criteria { faculty: Some("医学院".to_owned()), ..Criteria::default() };
        let subject = course(None, None);
        let gap = match_score(&subject, &matched) - match_score(&subject, &unmatched);
        assert!((gap - 20.0).abs() < 1e-9, "got gap {gap}");
    }

    #[test]
    fn easy_preference_rewards_high_ratings_in_tiers() {
        let criteria = Criteria { difficulty: Some(Difficulty::Easy), ..Criteria::default() };
        let top = match_score(&course(Some(4.5), None), &criteria);
        let mid = match_score(&course(Some(3.7), None), &criteria);
        let low = match_score(&course(Some(3.0), None), &criteria);
        assert!(top > mid && mid > low);
    }

    #[test]
    fn hard_preference_rewards_the_middle_band() {
        let criteria = Criteria { difficulty: Some(Difficulty::Hard), ..Criteria::default() };
        let in_band = match_score(&course(Some(3.5), None), &criteria);
        let out_of_band = match_score(&course(Some(4.8), None), &criteria);
        // rating sub-score favors 4.8; the difficulty term must pull back 10/3
        assert!((out_of_band - in_band - (6.5 - 10.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn popularity_is_log_compressed_and_capped() {
        let criteria = Criteria::default();
        let hundred = match_score(&course(None, Some(100)), &criteria);
        let thousand = match_score(&course(None, Some(1000)), &criteria);
        assert!((hundred - thousand).abs() < 1e-9, "cap at 100 reviews");
    }

    #[test]
    fn default_score_blends_rating_and_popularity() {
        let strong = default_score(&course(Some(4.6), Some(40)));
        let weak = default_score(&course(Some(3.0), Some(2)));
        assert!(strong > weak);
        assert!(strong <= 100.0);

        let unrated = default_score(&course(None, None));
        assert!((unrated - 40.0).abs() < 1e-9);
    }
}
