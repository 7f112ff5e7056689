use async_trait::async_trait;
use models::prestation::{self, ActiveModel, Column, Entity as Prestations, Model};
use models::record::NewPrestation;
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;

use super::filter::PrestationFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Rows per INSERT statement during bulk import.
const INSERT_CHUNK: usize = 1000;

/// Persistence seam for prestations.
#[async_trait]
pub trait PrestationRepository: Send + Sync {
    /// Matching rows ordered by id, one page at a time.
    async fn list(&self, filter: &PrestationFilter, page: Pagination) -> Result<Vec<Model>, ServiceError>;
    /// Every matching row ordered by id.
    async fn list_all(&self, filter: &PrestationFilter) -> Result<Vec<Model>, ServiceError>;
    async fn count(&self, filter: &PrestationFilter) -> Result<u64, ServiceError>;
    async fn get(&self, id: i32) -> Result<Option<Model>, ServiceError>;
    async fn create(&self, record: NewPrestation) -> Result<Model, ServiceError>;
    /// Overwrite row `id`; `None` when it does not exist.
    async fn replace(&self, id: i32, record: NewPrestation) -> Result<Option<Model>, ServiceError>;
    /// `false` when nothing was deleted.
    async fn delete(&self, id: i32) -> Result<bool, ServiceError>;
    /// Insert every record or none of them.
    async fn insert_all(&self, records: Vec<NewPrestation>) -> Result<u64, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmPrestationRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl PrestationRepository for SeaOrmPrestationRepository {
    async fn list(&self, filter: &PrestationFilter, page: Pagination) -> Result<Vec<Model>, ServiceError> {
        let rows = Prestations::find()
            .filter(filter.condition())
            .order_by_asc(Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_all(&self, filter: &PrestationFilter) -> Result<Vec<Model>, ServiceError> {
        let rows = Prestations::find()
            .filter(filter.condition())
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn count(&self, filter: &PrestationFilter) -> Result<u64, ServiceError> {
        let total = Prestations::find().filter(filter.condition()).count(&self.db).await?;
        Ok(total)
    }

    async fn get(&self, id: i32) -> Result<Option<Model>, ServiceError> {
        Ok(Prestations::find_by_id(id).one(&self.db).await?)
    }

    async fn create(&self, record: NewPrestation) -> Result<Model, ServiceError> {
        Ok(prestation::create(&self.db, record).await?)
    }

    async fn replace(&self, id: i32, record: NewPrestation) -> Result<Option<Model>, ServiceError> {
        Ok(prestation::replace(&self.db, id, record).await?)
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let res = Prestations::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_all(&self, records: Vec<NewPrestation>) -> Result<u64, ServiceError> {
        if records.is_empty() {
            return Ok(0);
        }
        let total = records.len() as u64;
        let txn = self.db.begin().await?;
        for chunk in records.chunks(INSERT_CHUNK) {
            // dropping `txn` on error rolls back
            Prestations::insert_many(chunk.iter().cloned().map(ActiveModel::from))
                .exec(&txn)
                .await?;
            debug!(rows = chunk.len(), "import chunk inserted");
        }
        txn.commit().await?;
        Ok(total)
    }
}

/// Simple in-memory repository for tests and local runs without a database
pub mod mock {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    #[derive(Default)]
    struct Store {
        rows: Vec<Model>,
        next_id: i32,
    }

    impl Store {
        fn push(&mut self, record: NewPrestation) -> Model {
            self.next_id += 1;
            let m = Model::from_record(self.next_id, record);
            self.rows.push(m.clone());
            m
        }
    }

    #[derive(Default)]
    pub struct InMemoryPrestationRepository {
        store: Mutex<Store>,
        /// Fail `insert_all` once this many records have been written.
        fail_insert_after: Option<usize>,
    }

    impl InMemoryPrestationRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Repository whose bulk insert breaks after `n` rows, as a lost
        /// connection would in the middle of a transaction.
        pub fn failing_after(n: usize) -> Self {
            Self { fail_insert_after: Some(n), ..Self::default() }
        }

        fn lock(&self) -> MutexGuard<'_, Store> {
            self.store.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn len(&self) -> usize {
            self.lock().rows.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl PrestationRepository for InMemoryPrestationRepository {
        async fn list(&self, filter: &PrestationFilter, page: Pagination) -> Result<Vec<Model>, ServiceError> {
            let store = self.lock();
            Ok(store
                .rows
                .iter()
                .filter(|m| filter.matches(m))
                .skip(page.skip as usize)
                .take(page.limit as usize)
                .cloned()
                .collect())
        }

        async fn list_all(&self, filter: &PrestationFilter) -> Result<Vec<Model>, ServiceError> {
            Ok(self.lock().rows.iter().filter(|m| filter.matches(m)).cloned().collect())
        }

        async fn count(&self, filter: &PrestationFilter) -> Result<u64, ServiceError> {
            Ok(self.lock().rows.iter().filter(|m| filter.matches(m)).count() as u64)
        }

        async fn get(&self, id: i32) -> Result<Option<Model>, ServiceError> {
            Ok(self.lock().rows.iter().find(|m| m.id == id).cloned())
        }

        async fn create(&self, record: NewPrestation) -> Result<Model, ServiceError> {
            Ok(self.lock().push(record))
        }

        async fn replace(&self, id: i32, record: NewPrestation) -> Result<Option<Model>, ServiceError> {
            let mut store = self.lock();
            let Some(slot) = store.rows.iter_mut().find(|m| m.id == id) else {
                return Ok(None);
            };
            *slot = Model::from_record(id, record);
            Ok(Some(slot.clone()))
        }

        async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
            let mut store = self.lock();
            let before = store.rows.len();
            store.rows.retain(|m| m.id != id);
            Ok(store.rows.len() < before)
        }

        async fn insert_all(&self, records: Vec<NewPrestation>) -> Result<u64, ServiceError> {
            let mut store = self.lock();
            // work on a copy so a failure leaves the store untouched
            let mut staged = Store { rows: store.rows.clone(), next_id: store.next_id };
            for (written, record) in records.into_iter().enumerate() {
                if self.fail_insert_after == Some(written) {
                    return Err(ServiceError::Db("connection lost during bulk insert".into()));
                }
                staged.push(record);
            }
            let total = (staged.rows.len() - store.rows.len()) as u64;
            *store = staged;
            Ok(total)
        }
    }
}
