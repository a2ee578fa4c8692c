use crate::course_key::UsageKey;
use crate::entities::student_modules;
use crate::error::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

/// Distinct grades recorded for `usage_key` with the number of learners at
/// each, lowest grade first. Ungraded rows are skipped.
pub async fn grade_histogram<C>(db: &C, usage_key: &UsageKey) -> Result<Vec<(f64, i64)>>
where
    C: ConnectionTrait,
{
    let rows = student_modules::Entity::find()
        .select_only()
        .column(student_modules::Column::Grade)
        .column_as(
            Expr::col((student_modules::Entity, student_modules::Column::Id)).count(),
            "count",
        )
        .filter(student_modules::Column::ModuleStateKey.eq(usage_key.to_string()))
        .filter(student_modules::Column::Grade.is_not_null())
        .group_by(student_modules::Column::Grade)
        .order_by_asc(student_modules::Column::Grade)
        .into_tuple::<(f64, i64)>()
        .all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_key::CourseKey;
    use crate::test_support::setup_db;
    use sea_orm::{ActiveModelTrait, Set};
    use uuid::Uuid;

    async fn record(
        db: &sea_orm::DatabaseConnection,
        student_id: i64,
        key: &UsageKey,
        grade: Option<f64>,
    ) {
        student_modules::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(student_id),
            course_id: Set("TestX/TS01/2015".to_string()),
            module_type: Set("problem".to_string()),
            module_state_key: Set(key.to_string()),
            grade: Set(grade),
            max_grade: Set(Some(100.0)),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_grade_histogram() {
        let db = setup_db().await;
        let course: CourseKey = "TestX/TS01/2015".parse().unwrap();
        let usage_key = course.make_usage_key("problem", "first_problem");
        let other_key = course.make_usage_key("problem", "second_problem");

        record(&db, 1, &usage_key, Some(100.0)).await;
        record(&db, 2, &usage_key, Some(50.0)).await;
        record(&db, 3, &usage_key, None).await;
        record(&db, 1, &other_key, Some(50.0)).await;

        let grades = grade_histogram(&db, &usage_key).await.unwrap();
        assert_eq!(grades, vec![(50.0, 1), (100.0, 1)]);
    }

    #[tokio::test]
    async fn test_grade_histogram_counts_shared_grades() {
        let db = setup_db().await;
        let course: CourseKey = "course-v1:edX+DemoX+2015".parse().unwrap();
        let usage_key = course.make_usage_key("problem", "p1");

        for student in 1..=3 {
            record(&db, student, &usage_key, Some(75.0)).await;
        }
        record(&db, 4, &usage_key, Some(20.0)).await;

        let grades = grade_histogram(&db, &usage_key).await.unwrap();
        assert_eq!(grades, vec![(20.0, 1), (75.0, 3)]);
        assert!(
            grade_histogram(&db, &course.make_usage_key("problem", "none"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
