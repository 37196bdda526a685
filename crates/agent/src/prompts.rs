//! Prompt rendering for the LLM-backed strategies.
//!
//! Prompts are built from the closed catalog directory so the service can
//! only ever answer with names that exist; the output shapes are pinned to
//! the exact JSON the parsers in `extract` and `narrative` validate against.

use coursey_core::engine::ScoredCourse;
use coursey_core::{Criteria, FACULTIES, TEACHERS};

pub(crate) fn intent_system_prompt() -> String {
    let mut prompt = String::from(
        "You are a course-requirement analyst. Extract structured course-search \
         parameters from the user's message.\n\n## Faculties (closed set - map loose \
         concept words onto the faculty that owns them):\n",
    );
    for faculty in FACULTIES {
        prompt.push_str(&format!("- {}: {}\n", faculty.name, faculty.concepts.join(", ")));
    }

    prompt.push_str("\n## Teachers (closed set):\n");
    for teacher in TEACHERS {
        prompt.push_str(&format!(
            "- {} ({}, {}): {}\n",
            teacher.name, teacher.faculty, teacher.title, teacher.specialty
        ));
    }

    prompt.push_str(
        "\n## Parameters:\n\
         - courseType: \"COMPULSORY\" or \"ELECTIVE\"\n\
         - credits: number\n\
         - keywords: array of interest keywords\n\
         - difficulty: \"easy\", \"medium\" or \"hard\"\n\
         - faculty: one of the five faculty names, verbatim\n\
         - teacher: one of the listed teacher names, verbatim\n\n\
         ## Rules:\n\
         1. Map fuzzy concept mentions onto the owning faculty before anything else.\n\
         2. Set every parameter the message does not mention to null (keywords to []).\n\
         3. Set needMoreInfo true only when the request is too vague to act on at all.\n\n\
         Respond with exactly this JSON shape:\n\
         {\n  \"intent\": \"query\",\n  \"parameters\": {\n    \"courseType\": null,\n    \
         \"credits\": null,\n    \"keywords\": [],\n    \"difficulty\": null,\n    \
         \"faculty\": null,\n    \"teacher\": null\n  },\n  \"confidence\": 0.9,\n  \
         \"needMoreInfo\": false,\n  \"nextQuestion\": null\n}\n",
    );

    prompt
}

pub(crate) fn intent_user_prompt(utterance: &str, prior: &Criteria) -> String {
    let mut prompt = format!("User message: {utterance}\n\n");

    if !prior.is_empty() {
        prompt.push_str("Already known requirements:\n");
        if let Some(course_type) = prior.course_type {
            prompt.push_str(&format!("- course type: {}\n", course_type.label()));
        }
        if let Some(credits) = prior.credits {
            prompt.push_str(&format!("- credits: {credits}\n"));
        }
        if !prior.keywords.is_empty() {
            prompt.push_str(&format!("- keywords: {}\n", prior.keywords.join("、")));
        }
        if let Some(difficulty) = prior.difficulty {
            prompt.push_str(&format!("- difficulty: {}\n", difficulty.as_str()));
        }
        if let Some(faculty) = &prior.faculty {
            prompt.push_str(&format!("- faculty: {faculty}\n"));
        }
        if let Some(teacher) = &prior.teacher {
            prompt.push_str(&format!("- teacher: {teacher}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Extract the new parameters from the message (map fuzzy concepts onto the \
         closed faculty list) and decide whether more information is needed.",
    );

    prompt
}

pub(crate) fn narrative_system_prompt() -> String {
    String::from(
        "You are a friendly, professional course advisor. Write a short greeting, one \
         specific persuasive reason per recommended course, and an optional study \
         suggestion. Write all user-facing text in Chinese. Base every reason on the \
         course data you are given; do not invent ratings or facts.\n\n\
         Respond with exactly this JSON shape:\n\
         {\n  \"greeting\": \"根据您的需求，我为您精选了以下课程：\",\n  \"courses\": [\n    \
         { \"course_id\": 1, \"reason\": \"这门课程评分4.5分，内容循序渐进，适合入门\" }\n  ],\n  \
         \"suggestion\": \"建议优先考虑第一门课程。\"\n}\n",
    )
}

pub(crate) fn narrative_user_prompt(criteria: &Criteria, courses: &[ScoredCourse]) -> String {
    let mut prompt = String::from("User requirements:\n");
    if let Some(course_type) = criteria.course_type {
        prompt.push_str(&format!("- course type: {}\n", course_type.label()));
    }
    if let Some(credits) = criteria.credits {
        prompt.push_str(&format!("- credits: {credits}\n"));
    }
    if !criteria.keywords.is_empty() {
        prompt.push_str(&format!("- keywords: {}\n", criteria.keywords.join("、")));
    }
    if let Some(difficulty) = criteria.difficulty {
        prompt.push_str(&format!("- difficulty: {}\n", difficulty.as_str()));
    }
    if let Some(faculty) = &criteria.faculty {
        prompt.push_str(&format!("- faculty: {faculty}\n"));
    }
    if let Some(teacher) = &criteria.teacher {
        prompt.push_str(&format!("- teacher: {teacher}\n"));
    }

    prompt.push_str("\nRecommended courses:\n");
    for (index, scored) in courses.iter().enumerate() {
        let course = &scored.course;
        prompt.push_str(&format!(
            "{}. {} ({})\n   - course_id: {}\n   - credits: {}\n   - type: {}\n",
            index + 1,
            course.name,
            course.code,
            course.id,
            course.credits,
            course.course_type.label()
        ));
        if let Some(rating) = course.average_rating {
            prompt.push_str(&format!("   - rating: {rating:.1}/5.0\n"));
        }
        if let Some(count) = course.review_count {
            prompt.push_str(&format!("   - reviews: {count}\n"));
        }
        prompt.push_str(&format!("   - teacher: {}\n", course.teacher_name));
        if !course.description.is_empty() {
            let short: String = course.description.chars().take(100).collect();
            prompt.push_str(&format!("   - description: {short}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str("Write the greeting, one reason per course, and a suggestion.");
    prompt
}
