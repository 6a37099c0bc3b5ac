use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    StoreId,
    Name,
    Phone,
    TotalOrders,
    TotalSpentCents,
    LastPurchaseAt,
    Score,
    Segment,
    VisitFrequencyDays,
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
                    .as_enum(Alias::new("customer_segment"))
                    .values(vec![
                        Alias::new("vip"),
                        Alias::new("frequent"),
                        Alias::new("occasional"),
                        Alias::new("inactive"),
                        Alias::new("new"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::StoreId).big_integer().not_null())
                    .col(ColumnDef::new(Customers::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Customers::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(Customers::TotalOrders)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::TotalSpentCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::LastPurchaseAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Customers::Score).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Customers::Segment)
                            .custom(Alias::new("customer_segment"))
                            .not_null()
                            .default(Expr::cust("'new'::customer_segment")),
                    )
                    .col(ColumnDef::new(Customers::VisitFrequencyDays).double().null())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_customers_store_score")
                    .table(Customers::Table)
                    .col(Customers::StoreId)
                    .col(Customers::Score)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("customer_segment")).to_owned())
            .await?;
        Ok(())
    }
}
