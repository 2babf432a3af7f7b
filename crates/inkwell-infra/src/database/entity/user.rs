use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use inkwell_core::domain::{Role, User};

use super::{StoredAiSettings, StoredImage};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub date_of_birth: Date,
    pub password_hash: String,
    pub role: UserRole,
    pub profile_picture: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub profile_image: Option<StoredImage>,
    #[sea_orm(column_type = "JsonBinary")]
    pub ai_settings: StoredAiSettings,
    #[sea_orm(nullable)]
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "author")]
    Author,
    #[sea_orm(string_value = "reader")]
    Reader,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Role::Admin,
            UserRole::Author => Role::Author,
            UserRole::Reader => Role::Reader,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => UserRole::Admin,
            Role::Author => UserRole::Author,
            Role::Reader => UserRole::Reader,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            firstname: model.firstname,
            lastname: model.lastname,
            username: model.username,
            email: model.email,
            date_of_birth: model.date_of_birth,
            password_hash: model.password_hash,
            role: model.role.into(),
            profile_picture: model.profile_picture,
            profile_image: model.profile_image.map(|image| image.0),
            ai_settings: model.ai_settings.0,
            reset_password_token: model.reset_password_token,
            reset_password_expires: model.reset_password_expires.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        Self {
            id: Set(user.id),
            firstname: Set(user.firstname),
            lastname: Set(user.lastname),
            username: Set(user.username),
            email: Set(user.email),
            date_of_birth: Set(user.date_of_birth),
            password_hash: Set(user.password_hash),
            role: Set(user.role.into()),
            profile_picture: Set(user.profile_picture),
            profile_image: Set(user.profile_image.map(StoredImage)),
            ai_settings: Set(StoredAiSettings(user.ai_settings)),
            reset_password_token: Set(user.reset_password_token),
            reset_password_expires: Set(user.reset_password_expires.map(Into::into)),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
