//! Document store access
//!
//! The core never owns a connection: every operation receives a
//! [`DocumentStore`] handle, so tests can run against [`MemoryStore`].

use async_trait::async_trait;
use asterank_common::{Collection, Document};

mod filter;
mod memory;

pub use filter::{compare_values, lookup_path, Condition, Filter};
pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Query on {collection} failed: {message}")]
    Query {
        collection: Collection,
        message: String,
    },

    #[error("Insert into {collection} failed: {message}")]
    Insert {
        collection: Collection,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Fields returned by a query; the identity field is always excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Fields(fields.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub projection: Projection,
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    /// Cap the result count. A limit of 0 means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }
}

/// Access to the backing document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Filtered find with projection, sort and limit.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// First record matching `filter`, if any.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: &Projection,
    ) -> StoreResult<Option<Document>> {
        let options = FindOptions::new().projection(projection.clone()).limit(1);
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> StoreResult<()>;
}
