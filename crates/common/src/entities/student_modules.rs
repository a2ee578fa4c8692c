use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-learner courseware state row; only the grading columns are used here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_modules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: i64,
    pub course_id: String,
    pub module_type: String,
    pub module_state_key: String,
    pub grade: Option<f64>,
    pub max_grade: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        unreachable!("student_modules has no relations")
    }
}

super::timestamped_behavior!();
