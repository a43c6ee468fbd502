use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::events::Event;
use crate::indexer_states::{IndexerState, UnsavedIndexerState};

use super::repo::{Repo, RepoError, SQLikeMigrations};

pub type PostgresRepoPool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type PostgresRepoConn<'a> =
    bb8::PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(Clone)]
pub struct PostgresRepo {
    pool: PostgresRepoPool,
}

impl PostgresRepo {
    pub async fn new(url: &str) -> Result<Self, RepoError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = bb8::Pool::builder()
            .build(manager)
            .await
            .map_err(|error| RepoError::Unknown(error.to_string()))?;

        Ok(Self { pool })
    }

    async fn get_conn(&self) -> Result<PostgresRepoConn<'_>, RepoError> {
        self.pool.get().await.map_err(|_| RepoError::NotConnected)
    }
}

#[async_trait::async_trait]
impl Repo for PostgresRepo {
    async fn migrate(&self) -> Result<(), RepoError> {
        let mut conn = self.get_conn().await?;

        for migration in SQLikeMigrations::get_internal_migrations() {
            diesel::sql_query(migration)
                .execute(&mut conn)
                .await
                .map_err(|error| RepoError::Unknown(error.to_string()))?;
        }

        Ok(())
    }

    async fn get_indexer_state(
        &self,
        address: &str,
    ) -> Result<Option<IndexerState>, RepoError> {
        use crate::diesel::schema::propindexing_indexer_states::dsl::*;

        let mut conn = self.get_conn().await?;

        propindexing_indexer_states
            .filter(contract_address.eq(address.to_lowercase()))
            .first::<IndexerState>(&mut conn)
            .await
            .optional()
            .map_err(|error| RepoError::Unknown(error.to_string()))
    }

    async fn get_all_indexer_states(&self) -> Result<Vec<IndexerState>, RepoError> {
        use crate::diesel::schema::propindexing_indexer_states::dsl::*;

        let mut conn = self.get_conn().await?;

        propindexing_indexer_states
            .load(&mut conn)
            .await
            .map_err(|error| RepoError::Unknown(error.to_string()))
    }

    async fn record_batch(
        &self,
        new_state: &UnsavedIndexerState,
        events: &[Event],
    ) -> Result<(), RepoError> {
        let mut conn = self.get_conn().await?;

        conn.transaction::<(), DieselError, _>(|conn| {
            async move {
                if !events.is_empty() {
                    use crate::diesel::schema::propindexing_events::dsl::*;

                    diesel::insert_into(propindexing_events)
                        .values(events)
                        .on_conflict((contract_address, transaction_hash, log_index))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }

                {
                    use crate::diesel::schema::propindexing_indexer_states::dsl::*;

                    diesel::insert_into(propindexing_indexer_states)
                        .values(new_state)
                        .on_conflict(contract_address)
                        .do_update()
                        .set((
                            last_processed_block.eq(excluded(last_processed_block)),
                            last_block_hash.eq(excluded(last_block_hash)),
                            last_checkpoint_block.eq(excluded(last_checkpoint_block)),
                            last_checkpoint_hash.eq(excluded(last_checkpoint_hash)),
                        ))
                        .execute(conn)
                        .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| RepoError::Unknown(error.to_string()))
    }

    async fn roll_back_to_checkpoint(
        &self,
        address: &str,
        checkpoint_block_number: u64,
    ) -> Result<(), RepoError> {
        let address = address.to_lowercase();
        let mut conn = self.get_conn().await?;

        conn.transaction::<(), DieselError, _>(|conn| {
            let address = address.clone();

            async move {
                {
                    use crate::diesel::schema::propindexing_events::dsl::*;

                    diesel::delete(
                        propindexing_events
                            .filter(contract_address.eq(address.clone()))
                            .filter(block_number.ge(checkpoint_block_number as i64)),
                    )
                    .execute(conn)
                    .await?;
                }

                {
                    use crate::diesel::schema::propindexing_indexer_states::dsl::*;

                    diesel::update(
                        propindexing_indexer_states.filter(contract_address.eq(address)),
                    )
                    .set((
                        last_processed_block.eq(checkpoint_block_number as i64 - 1),
                        last_block_hash.eq(None::<String>),
                        last_checkpoint_block.eq(None::<i64>),
                        last_checkpoint_hash.eq(None::<String>),
                    ))
                    .execute(conn)
                    .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| RepoError::Unknown(error.to_string()))
    }

    async fn get_events(
        &self,
        address: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Event>, RepoError> {
        use crate::diesel::schema::propindexing_events::dsl::*;

        let mut conn = self.get_conn().await?;

        propindexing_events
            .filter(contract_address.eq(address.to_lowercase()))
            .filter(block_number.ge(from_block as i64))
            .filter(block_number.le(to_block as i64))
            .order((block_number.asc(), log_index.asc()))
            .load(&mut conn)
            .await
            .map_err(|error| RepoError::Unknown(error.to_string()))
    }

    async fn get_all_events(&self) -> Result<Vec<Event>, RepoError> {
        use crate::diesel::schema::propindexing_events::dsl::*;

        let mut conn = self.get_conn().await?;

        propindexing_events
            .order((block_number.asc(), log_index.asc()))
            .load(&mut conn)
            .await
            .map_err(|error| RepoError::Unknown(error.to_string()))
    }
}
