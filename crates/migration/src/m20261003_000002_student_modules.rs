use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StudentModules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentModules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentModules::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentModules::CourseId).string_len(255).not_null())
                    .col(
                        ColumnDef::new(StudentModules::ModuleType)
                            .string_len(32)
                            .not_null()
                            .default("problem"),
                    )
                    .col(
                        ColumnDef::new(StudentModules::ModuleStateKey)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentModules::Grade).double().null())
                    .col(ColumnDef::new(StudentModules::MaxGrade).double().null())
                    .col(
                        ColumnDef::new(StudentModules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentModules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("student_modules_student_state_key")
                    .table(StudentModules::Table)
                    .col(StudentModules::StudentId)
                    .col(StudentModules::ModuleStateKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("student_modules_state_key_idx")
                    .table(StudentModules::Table)
                    .col(StudentModules::ModuleStateKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StudentModules::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum StudentModules {
    Table,
    Id,
    StudentId,
    CourseId,
    ModuleType,
    ModuleStateKey,
    Grade,
    MaxGrade,
    CreatedAt,
    UpdatedAt,
}
