use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240501_000001_create_table::Budgets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per budget, remembering the last alert band sent for a period
        manager
            .create_table(
                Table::create()
                    .table(BudgetAlertStates::Table)
                    .if_not_exists()
                    .col(integer(BudgetAlertStates::BudgetId).primary_key())
                    .col(date(BudgetAlertStates::PeriodStart))
                    .col(date(BudgetAlertStates::PeriodEnd))
                    .col(string_len(BudgetAlertStates::Band, 16))
                    .col(timestamp_with_time_zone(BudgetAlertStates::NotifiedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_alert_state_budget")
                            .from(BudgetAlertStates::Table, BudgetAlertStates::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BudgetAlertStates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BudgetAlertStates {
    Table,
    BudgetId,
    PeriodStart,
    PeriodEnd,
    Band,
    NotifiedAt,
}
