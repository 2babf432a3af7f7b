use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Firstname).string().not_null())
                    .col(ColumnDef::new(Users::Lastname).string().not_null())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("reader"),
                    )
                    .col(ColumnDef::new(Users::ProfilePicture).string().not_null())
                    .col(ColumnDef::new(Users::ProfileImage).json_binary().null())
                    .col(ColumnDef::new(Users::AiSettings).json_binary().not_null())
                    .col(ColumnDef::new(Users::ResetPasswordToken).string().null())
                    .col(
                        ColumnDef::new(Users::ResetPasswordExpires)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_reset_password_token")
                    .table(Users::Table)
                    .col(Users::ResetPasswordToken)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Firstname,
    Lastname,
    Username,
    Email,
    DateOfBirth,
    PasswordHash,
    Role,
    ProfilePicture,
    ProfileImage,
    AiSettings,
    ResetPasswordToken,
    ResetPasswordExpires,
    CreatedAt,
    UpdatedAt,
}
