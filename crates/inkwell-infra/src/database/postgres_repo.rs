//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use uuid::Uuid;

use inkwell_core::domain::{AiMeta, LikeToggle, Post, PostQuery, User};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::StoredAiMeta;
use super::postgres_base::{map_db_err, PostgresBaseRepository};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Flip membership of `$2` in the likes array in one statement, so
/// concurrent toggles never lose an update.
const TOGGLE_LIKE_SQL: &str = r#"
UPDATE posts
SET likes = CASE
    WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
    ELSE array_append(likes, $2)
END
WHERE id = $1
RETURNING $2 = ANY(likes) AS liked, cardinality(likes) AS like_count
"#;

/// Mask an email for logging to avoid PII in logs.
pub(crate) fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::ResetPasswordToken.eq(token))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let mut condition = Condition::all();

        if let Some(text) = query.text.as_deref() {
            let pattern = like_pattern(text);
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(post::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(post::Column::Content)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        if !query.tags.is_empty() {
            condition = condition.add(Expr::cust_with_values(
                r#""tags" && $1"#,
                [query.tags.clone()],
            ));
        }

        let result = PostEntity::find()
            .filter(condition)
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut select = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt);
        if let Some(limit) = limit {
            select = select.limit(limit);
        }

        let result = select.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let updated = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(updated.into_iter().next().map(Into::into))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>, RepoError> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                TOGGLE_LIKE_SQL,
                [id.into(), user_id.into()],
            ))
            .await
            .map_err(map_db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let liked: bool = row.try_get("", "liked").map_err(map_db_err)?;
        let like_count: i32 = row.try_get("", "like_count").map_err(map_db_err)?;

        tracing::debug!(post_id = %id, liked, like_count, "Toggled like");

        Ok(Some(LikeToggle {
            liked,
            like_count: i64::from(like_count),
        }))
    }

    async fn set_ai_meta(&self, id: Uuid, meta: AiMeta) -> Result<Option<Post>, RepoError> {
        let active = post::ActiveModel {
            id: Unchanged(id),
            ai_meta: Set(Some(StoredAiMeta(meta))),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match active.update(&self.db).await {
            Ok(model) => Ok(Some(model.into())),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(map_db_err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("j@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }
}
