use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Password))
                    .to_owned(),
            )
            .await?;

        // Create orientations table
        manager
            .create_table(
                Table::create()
                    .table(Orientations::Table)
                    .if_not_exists()
                    .col(pk_auto(Orientations::Id))
                    .col(string_len(Orientations::Name, 100).unique_key())
                    .col(string_len(Orientations::Status, 20).default("active"))
                    .to_owned(),
            )
            .await?;

        // Create user_details table
        manager
            .create_table(
                Table::create()
                    .table(UserDetails::Table)
                    .if_not_exists()
                    .col(pk_auto(UserDetails::Id))
                    .col(integer(UserDetails::UserId).unique_key())
                    .col(string(UserDetails::FirstName))
                    .col(string(UserDetails::LastName))
                    .col(string(UserDetails::DocumentId))
                    .col(string(UserDetails::Email).unique_key())
                    .col(string_len(UserDetails::Role, 20))
                    .col(integer_null(UserDetails::SchoolYear))
                    .col(integer_null(UserDetails::OrientationId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_details_user")
                            .from(UserDetails::Table, UserDetails::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_details_orientation")
                            .from(UserDetails::Table, UserDetails::OrientationId)
                            .to(Orientations::Table, Orientations::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create subjects table
        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(pk_auto(Subjects::Id))
                    .col(string(Subjects::Name))
                    .col(integer(Subjects::OrientationId))
                    .col(integer(Subjects::Year))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subjects_orientation")
                            .from(Subjects::Table, Subjects::OrientationId)
                            .to(Orientations::Table, Orientations::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_subjects_name_orientation_year")
                    .table(Subjects::Table)
                    .col(Subjects::Name)
                    .col(Subjects::OrientationId)
                    .col(Subjects::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create enrollments table
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(pk_auto(Enrollments::Id))
                    .col(integer(Enrollments::UserId))
                    .col(integer(Enrollments::SubjectId))
                    .col(string(Enrollments::State).default("in-progress"))
                    .col(integer_null(Enrollments::Grade))
                    .col(date(Enrollments::EnrolledOn))
                    .col(integer(Enrollments::YearTaken))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_user")
                            .from(Enrollments::Table, Enrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_subject")
                            .from(Enrollments::Table, Enrollments::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_enrollments_user_subject")
                    .table(Enrollments::Table)
                    .col(Enrollments::UserId)
                    .col(Enrollments::SubjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create installments table
        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(pk_auto(Installments::Id))
                    .col(integer(Installments::UserId))
                    .col(string(Installments::Period))
                    .col(date(Installments::DueDate))
                    .col(decimal(Installments::AmountDue).decimal_len(10, 2))
                    .col(decimal(Installments::PaidAmount).decimal_len(10, 2).default(0))
                    .col(decimal(Installments::Balance).decimal_len(10, 2))
                    .col(string_len(Installments::Status, 20).default("pending"))
                    .col(boolean(Installments::Notified).default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_user")
                            .from(Installments::Table, Installments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_installments_due_date")
                    .table(Installments::Table)
                    .col(Installments::DueDate)
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::UserId))
                    .col(integer(Payments::InstallmentId))
                    .col(date_time(Payments::PaidAt))
                    .col(decimal(Payments::Amount).decimal_len(10, 2))
                    .col(string_len(Payments::Method, 30))
                    .col(string_null(Payments::Receipt))
                    .col(integer_null(Payments::RecordedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_user")
                            .from(Payments::Table, Payments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_installment")
                            .from(Payments::Table, Payments::InstallmentId)
                            .to(Installments::Table, Installments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_recorded_by")
                            .from(Payments::Table, Payments::RecordedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notifications table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Notifications::Id))
                    .col(integer(Notifications::UserId))
                    .col(integer(Notifications::InstallmentId))
                    .col(string_len(Notifications::Kind, 40))
                    .col(string_len(Notifications::Recipient, 20))
                    .col(text(Notifications::Message))
                    .col(date_time(Notifications::SentAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_installment")
                            .from(Notifications::Table, Notifications::InstallmentId)
                            .to(Installments::Table, Installments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserDetails::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orientations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
}

#[derive(DeriveIden)]
enum UserDetails {
    Table,
    Id,
    UserId,
    FirstName,
    LastName,
    DocumentId,
    Email,
    Role,
    SchoolYear,
    OrientationId,
}

#[derive(DeriveIden)]
enum Orientations {
    Table,
    Id,
    Name,
    Status,
}

#[derive(DeriveIden)]
enum Subjects {
    Table,
    Id,
    Name,
    OrientationId,
    Year,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    UserId,
    SubjectId,
    State,
    Grade,
    EnrolledOn,
    YearTaken,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    UserId,
    Period,
    DueDate,
    AmountDue,
    PaidAmount,
    Balance,
    Status,
    Notified,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    UserId,
    InstallmentId,
    PaidAt,
    Amount,
    Method,
    Receipt,
    RecordedBy,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    InstallmentId,
    Kind,
    Recipient,
    Message,
    SentAt,
}
