//! Create `prestations` table.
//! Monetary and rate columns are fixed-point NUMERIC with two fractional digits.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prestations::Table)
                    .if_not_exists()
                    .col(pk_auto(Prestations::Id))
                    .col(integer_null(Prestations::OrderNumber))
                    .col(date(Prestations::Date).not_null())
                    .col(string_len(Prestations::LastName, 128).not_null())
                    .col(string_len(Prestations::FirstName, 128).not_null())
                    .col(string_len(Prestations::InvoiceNumber, 64).not_null())
                    .col(string_len(Prestations::PatientIndex, 64).not_null())
                    .col(string_len(Prestations::Matricule, 64).not_null())
                    .col(string_len(Prestations::Specialty, 64).not_null())
                    .col(string_len(Prestations::Act, 256).not_null())
                    .col(decimal_len(Prestations::RatePercent, 5, 2).not_null())
                    .col(decimal_len(Prestations::PatientShare, 12, 2).not_null())
                    .col(decimal_len(Prestations::EmployeeShare, 12, 2).not_null())
                    .col(decimal_len(Prestations::TotalAmount, 12, 2).not_null())
                    .col(decimal_len(Prestations::Adjustment, 12, 2).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Prestations::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Prestations {
    Table,
    Id,
    OrderNumber,
    Date,
    LastName,
    FirstName,
    InvoiceNumber,
    PatientIndex,
    Matricule,
    Specialty,
    Act,
    RatePercent,
    PatientShare,
    EmployeeShare,
    TotalAmount,
    Adjustment,
}
