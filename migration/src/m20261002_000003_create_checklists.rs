use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Checklists {
    Table,
    Id,
    StoreId,
    ChecklistType,
    ReferenceDate,
    Status,
    CompletedAt,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("checklist_status"))
                    .values(vec![
                        Alias::new("open"),
                        Alias::new("completed"),
                        Alias::new("auto_closed"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Checklists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Checklists::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Checklists::StoreId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Checklists::ChecklistType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Checklists::ReferenceDate).date().not_null())
                    .col(
                        ColumnDef::new(Checklists::Status)
                            .custom(Alias::new("checklist_status"))
                            .not_null()
                            .default(Expr::cust("'open'::checklist_status")),
                    )
                    .col(
                        ColumnDef::new(Checklists::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Checklists::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Checklists::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Checklists::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个门店、类型、日期只允许一份清单
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_checklists_store_type_date")
                    .table(Checklists::Table)
                    .col(Checklists::StoreId)
                    .col(Checklists::ChecklistType)
                    .col(Checklists::ReferenceDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Checklists::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("checklist_status")).to_owned())
            .await?;
        Ok(())
    }
}
