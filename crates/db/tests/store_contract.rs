//! Contract tests for the sqlite-backed conversation store and course
//! catalog against an in-memory database.

use coursey_core::{
    Conversation, ConversationId, ConversationStore, CourseCatalog, Criteria, CourseType, Message,
    RecommendedCourse, StoreError,
};
use coursey_db::{connect_with_settings, migrations, seed_courses, DbPool};
use coursey_db::{SqlConversationStore, SqlCourseCatalog};

async fn prepared_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    pool
}

fn recommended_course() -> RecommendedCourse {
    RecommendedCourse {
        id: 2,
        code: "CS301".to_owned(),
        name: "人工智能导论".to_owned(),
        credits: 3.0,
        course_type: CourseType::Elective,
        faculty_name: "创新工程学院".to_owned(),
        teacher_name: "陈伟".to_owned(),
        description: String::new(),
        average_rating: Some(4.7),
        review_count: Some(48),
        reason: "评分4.7分，学生评价优秀".to_owned(),
    }
}

#[tokio::test]
async fn conversation_round_trip_preserves_messages_and_criteria() {
    let pool = prepared_pool().await;
    let store = SqlConversationStore::new(pool);

    let id = ConversationId::from("conv_roundtrip");
    store.create(Conversation::new(id.clone(), "student-1")).await.expect("create");

    store.append_message(&id, Message::user("我想要3学分的选修课")).await.expect("user message");
    store
        .append_message(
            &id,
            Message::recommendation("根据您的需求，我为您推荐以下课程：", vec![recommended_course()]),
        )
        .await
        .expect("assistant message");

    let criteria = Criteria {
        course_type: Some(CourseType::Elective),
        credits: Some(3.0),
        ..Criteria::default()
    };
    store.update_criteria(&id, &criteria).await.expect("criteria");
    store.update_title(&id, "我想要3学分的选修课").await.expect("title");

    let loaded = store.get(&id).await.expect("get").expect("present");
    assert_eq!(loaded.title, "我想要3学分的选修课");
    assert_eq!(loaded.criteria, criteria);
    assert_eq!(loaded.messages.len(), 2);
    assert_eq!(loaded.messages[0].content, "我想要3学分的选修课");
    assert_eq!(loaded.messages[1].courses.len(), 1);
    assert_eq!(loaded.messages[1].courses[0].reason, "评分4.7分，学生评价优秀");
}

#[tokio::test]
async fn get_reports_absence_as_none() {
    let pool = prepared_pool().await;
    let store = SqlConversationStore::new(pool);

    let loaded = store.get(&ConversationId::from("conv_absent")).await.expect("get");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn operations_on_missing_conversations_are_not_found() {
    let pool = prepared_pool().await;
    let store = SqlConversationStore::new(pool);
    let id = ConversationId::from("conv_missing");

    let append = store.append_message(&id, Message::user("hi")).await;
    assert!(matches!(append, Err(StoreError::NotFound(_))));

    let update = store.update_criteria(&id, &Criteria::default()).await;
    assert!(matches!(update, Err(StoreError::NotFound(_))));

    let delete = store.delete(&id).await;
    assert!(matches!(delete, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn listing_is_scoped_by_user_and_delete_all_clears_it() {
    let pool = prepared_pool().await;
    let store = SqlConversationStore::new(pool);

    for (suffix, user) in [("a", "student-1"), ("b", "student-1"), ("c", "student-2")] {
        let id = ConversationId::from(format!("conv_{suffix}").as_str());
        store.create(Conversation::new(id, user)).await.expect("create");
    }

    let listed = store.list_all("student-1").await.expect("list");
    assert_eq!(listed.len(), 2);

    store.delete_all("student-1").await.expect("delete all");
    assert!(store.list_all("student-1").await.expect("list").is_empty());
    assert_eq!(store.list_all("student-2").await.expect("list").len(), 1);
}

#[tokio::test]
async fn deleting_a_conversation_cascades_to_its_messages() {
    let pool = prepared_pool().await;
    let store = SqlConversationStore::new(pool.clone());

    let id = ConversationId::from("conv_cascade");
    store.create(Conversation::new(id.clone(), "student-1")).await.expect("create");
    store.append_message(&id, Message::user("hello")).await.expect("append");
    store.delete(&id).await.expect("delete");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn seeded_catalog_loads_through_the_sql_catalog() {
    let pool = prepared_pool().await;
    let summary = seed_courses(&pool).await.expect("seed");
    assert!(!summary.skipped);
    assert!(summary.inserted >= 15);

    let catalog = SqlCourseCatalog::new(pool.clone());
    let courses = catalog.all_courses().await.expect("courses");
    assert_eq!(courses.len(), summary.inserted);
    assert!(courses.iter().any(|course| course.faculty_name == "创新工程学院"));
    assert!(courses.iter().any(|course| course.average_rating.is_none()));

    // Seeding again is a no-op.
    let again = seed_courses(&pool).await.expect("re-seed");
    assert!(again.skipped);
    assert_eq!(again.inserted, 0);
}
