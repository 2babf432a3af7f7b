use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait, SqlErr,
};

use inkwell_core::error::RepoError;
use inkwell_core::ports::BaseRepository;

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Map a SeaORM error onto the repository error space.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => RepoError::Constraint(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => RepoError::Constraint(detail),
        _ => match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
            DbErr::Conn(e) => RepoError::Connection(e.to_string()),
            other => RepoError::Query(other.to_string()),
        },
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.update(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
