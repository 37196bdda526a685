//! Deterministic catalog seed for local runs and contract tests.
//!
//! Three courses per faculty, spread across the closed teacher directory,
//! with ratings and review counts shaped so the default popularity ranking
//! and the difficulty bands both have material to work with.

use sqlx::Row;

use crate::repositories::RepositoryError;
use crate::DbPool;

struct SeedCourse {
    id: i64,
    code: &'static str,
    name: &'static str,
    credits: f64,
    course_type: &'static str,
    faculty_name: &'static str,
    teacher_name: &'static str,
    description: &'static str,
    average_rating: Option<f64>,
    review_count: Option<i64>,
}

const SEED_COURSES: &[SeedCourse] = &[
    SeedCourse {
        id: 1,
        code: "CS101",
        name: "程序设计基础",
        credits: 3.0,
        course_type: "COMPULSORY",
        faculty_name: "创新工程学院",
        teacher_name: "林晓明",
        description: "面向零基础学生的编程入门课程，覆盖基本语法、数据结构与简单算法。",
        average_rating: Some(4.5),
        review_count: Some(56),
    },
    SeedCourse {
        id: 2,
        code: "CS301",
        name: "人工智能导论",
        credits: 3.0,
        course_type: "ELECTIVE",
        faculty_name: "创新工程学院",
        teacher_name: "陈伟",
        description: "介绍人工智能与机器学习的核心概念，包含动手实验项目。",
        average_rating: Some(4.7),
        review_count: Some(48),
    },
    SeedCourse {
        id: 3,
        code: "CS210",
        name: "数据库系统",
        credits: 4.0,
        course_type: "COMPULSORY",
        faculty_name: "创新工程学院",
        teacher_name: "林晓明",
        description: "关系模型、SQL 与事务处理，附带数据库设计大作业。",
        average_rating: Some(3.8),
        review_count: Some(33),
    },
    SeedCourse {
        id: 4,
        code: "BUS110",
        name: "会计学原理",
        credits: 3.0,
        course_type: "COMPULSORY",
        faculty_name: "商学院",
        teacher_name: "黄建华",
        description: "财务会计基础，报表阅读与编制。",
        average_rating: Some(4.0),
        review_count: Some(41),
    },
    SeedCourse {
        id: 5,
        code: "BUS220",
        name: "市场营销学",
        credits: 2.0,
        course_type: "ELECTIVE",
        faculty_name: "商学院",
        teacher_name: "周梅",
        description: "消费者行为、品牌与数字营销策略案例分析。",
        average_rating: Some(4.3),
        review_count: Some(29),
    },
    SeedCourse {
        id: 6,
        code: "BUS330",
        name: "投资分析",
        credits: 3.0,
        course_type: "ELECTIVE",
        faculty_name: "商学院",
        teacher_name: "黄建华",
        description: "证券估值与投资组合管理，适合有一定会计基础的学生。",
        average_rating: Some(3.6),
        review_count: Some(18),
    },
    SeedCourse {
        id: 7,
        code: "ART105",
        name: "设计思维",
        credits: 2.0,
        course_type: "ELECTIVE",
        faculty_name: "人文艺术学院",
        teacher_name: "王艺琳",
        description: "以工作坊形式训练创意与视觉表达，无先修要求。",
        average_rating: Some(4.6),
        review_count: Some(37),
    },
    SeedCourse {
        id: 8,
        code: "ART210",
        name: "创意写作",
        credits: 3.0,
        course_type: "ELECTIVE",
        faculty_name: "人文艺术学院",
        teacher_name: "刘芳",
        description: "叙事结构与文体练习，每周一篇短文写作。",
        average_rating: Some(4.2),
        review_count: Some(22),
    },
    SeedCourse {
        id: 9,
        code: "ART120",
        name: "艺术史导论",
        credits: 2.0,
        course_type: "COMPULSORY",
        faculty_name: "人文艺术学院",
        teacher_name: "王艺琳",
        description: "从古典到当代的艺术流派概览。",
        average_rating: Some(3.9),
        review_count: Some(15),
    },
    SeedCourse {
        id: 10,
        code: "HTM101",
        name: "酒店管理概论",
        credits: 3.0,
        course_type: "COMPULSORY",
        faculty_name: "酒店与旅游管理学院",
        teacher_name: "张红",
        description: "酒店运营、前厅与客房管理基础。",
        average_rating: Some(4.1),
        review_count: Some(26),
    },
    SeedCourse {
        id: 11,
        code: "HTM230",
        name: "旅游经济学",
        credits: 3.0,
        course_type: "ELECTIVE",
        faculty_name: "酒店与旅游管理学院",
        teacher_name: "李强",
        description: "旅游市场供需、定价与目的地竞争分析。",
        average_rating: Some(3.5),
        review_count: Some(11),
    },
    SeedCourse {
        id: 12,
        code: "HTM240",
        name: "会展策划",
        credits: 2.0,
        course_type: "ELECTIVE",
        faculty_name: "酒店与旅游管理学院",
        teacher_name: "张红",
        description: "大型会展项目的策划与执行流程。",
        average_rating: None,
        review_count: None,
    },
    SeedCourse {
        id: 13,
        code: "MED101",
        name: "人体解剖学",
        credits: 4.0,
        course_type: "COMPULSORY",
        faculty_name: "医学院",
        teacher_name: "赵明德",
        description: "系统解剖学基础，含实验课。",
        average_rating: Some(3.7),
        review_count: Some(52),
    },
    SeedCourse {
        id: 14,
        code: "MED220",
        name: "临床药理学",
        credits: 3.0,
        course_type: "COMPULSORY",
        faculty_name: "医学院",
        teacher_name: "孙丽丽",
        description: "常用药物的作用机制与临床应用。",
        average_rating: Some(4.4),
        review_count: Some(44),
    },
    SeedCourse {
        id: 15,
        code: "MED130",
        name: "健康与生活方式",
        credits: 2.0,
        course_type: "ELECTIVE",
        faculty_name: "医学院",
        teacher_name: "孙丽丽",
        description: "面向全校学生的健康通识课，内容轻松实用。",
        average_rating: Some(4.8),
        review_count: Some(63),
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: bool,
}

/// Inserts the seed catalog unless the courses table already has rows.
pub async fn seed_courses(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM courses").fetch_one(pool).await?;
    let existing: i64 = row.get("count");
    if existing > 0 {
        return Ok(SeedSummary { inserted: 0, skipped: true });
    }

    for course in SEED_COURSES {
        sqlx::query(
            "INSERT INTO courses \
             (id, code, name, credits, course_type, faculty_name, teacher_name, description, \
              average_rating, review_count) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(course.id)
        .bind(course.code)
        .bind(course.name)
        .bind(course.credits)
        .bind(course.course_type)
        .bind(course.faculty_name)
        .bind(course.teacher_name)
        .bind(course.description)
        .bind(course.average_rating)
        .bind(course.review_count)
        .execute(pool)
        .await?;
    }

    Ok(SeedSummary { inserted: SEED_COURSES.len(), skipped: false })
}

#[cfg(test)]
mod tests {
    use coursey_core::{FACULTIES, TEACHERS};

    use super::SEED_COURSES;

    #[test]
    fn seed_references_only_directory_names() {
        for course in SEED_COURSES {
            assert!(
                FACULTIES.iter().any(|faculty| faculty.name == course.faculty_name),
                "course {} references unknown faculty {}",
                course.code,
                course.faculty_name
            );
            assert!(
                TEACHERS.iter().any(|teacher| teacher.name == course.teacher_name),
                "course {} references unknown teacher {}",
                course.code,
                course.teacher_name
            );
        }
    }

    #[test]
    fn seed_ids_and_codes_are_unique() {
        let mut ids: Vec<i64> = SEED_COURSES.iter().map(|course| course.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SEED_COURSES.len());

        let mut codes: Vec<&str> = SEED_COURSES.iter().map(|course| course.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SEED_COURSES.len());
    }
}
