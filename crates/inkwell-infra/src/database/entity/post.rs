use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

use inkwell_core::domain::Post;

use super::{StoredAiMeta, StoredImage};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub cover_image: StoredImage,
    pub likes: Vec<Uuid>,
    pub view_count: i64,
    pub tags: Vec<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub ai_meta: Option<StoredAiMeta>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            content: model.content,
            cover_image: model.cover_image.0,
            likes: model.likes,
            view_count: model.view_count,
            tags: model.tags,
            ai_meta: model.ai_meta.map(|meta| meta.0),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Likes and the view counter are left unset: inserts take the column
/// defaults and updates never overwrite concurrent counter changes.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            content: Set(post.content),
            cover_image: Set(StoredImage(post.cover_image)),
            likes: NotSet,
            view_count: NotSet,
            tags: Set(post.tags),
            ai_meta: Set(post.ai_meta.map(StoredAiMeta)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
