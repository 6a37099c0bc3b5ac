use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ChecklistDeadlineSettings {
    Table,
    Id,
    StoreId,
    ChecklistType,
    DeadlineHour,
    DeadlineMinute,
    IsNextDay,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChecklistDeadlineSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::StoreId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::ChecklistType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::DeadlineHour)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::DeadlineMinute)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::IsNextDay)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ChecklistDeadlineSettings::IsActive).boolean().null())
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ChecklistDeadlineSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // one setting per (store_id, checklist_type)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_checklist_deadline_settings_store_type")
                    .table(ChecklistDeadlineSettings::Table)
                    .col(ChecklistDeadlineSettings::StoreId)
                    .col(ChecklistDeadlineSettings::ChecklistType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ChecklistDeadlineSettings::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
