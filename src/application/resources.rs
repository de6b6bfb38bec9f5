//! Cached reads and cache-aware mutations per resource kind.
//!
//! Reads go through the [`QueryCache`] under these keys:
//!
//! - `[kind]` - full listing
//! - `[kind, filter]` - filtered listing (students by batch)
//! - `[kind, "paged", page, size, sort]` - one page
//! - `[kind, id]` - one record
//!
//! Mutations call the backend, then mark the affected keys stale (never
//! refetching), prime the record's own key with the server's response, and
//! notify the user of the outcome.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::academy::{
    Batch, BatchType, Class, Mentor, MentorSession, Page, Record, Student,
};
use crate::domain::cache::QueryKey;
use crate::domain::foundation::{Collection, ResourceKind};
use crate::ports::{ApiError, Notification, Notifier, ResourceApi};

use super::query_cache::QueryCache;

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Listings may come back bare or wrapped in a page; both yield the records.
fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    match value {
        Value::Object(mut page) if page.contains_key("content") => {
            decode(page.remove("content").unwrap_or(Value::Null))
        }
        Value::Null => Ok(Vec::new()),
        other => decode(other),
    }
}

/// Server detail for a failed mutation, else `fallback`.
fn failure_detail(error: &ApiError, fallback: String) -> String {
    match error {
        ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
        _ => fallback,
    }
}

/// Reads and mutations for one record type.
pub struct ResourceService<R: Record> {
    api: Arc<dyn ResourceApi>,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
            notifier: Arc::clone(&self.notifier),
            _record: PhantomData,
        }
    }
}

impl<R: Record> ResourceService<R> {
    pub fn new(api: Arc<dyn ResourceApi>, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            cache,
            notifier,
            _record: PhantomData,
        }
    }

    fn path(&self) -> &'static str {
        R::COLLECTION.rest_path()
    }

    fn entity_path(&self, id: i64) -> String {
        format!("{}/{}", self.path(), id)
    }

    fn label(&self) -> &'static str {
        R::COLLECTION.singular_label()
    }

    fn succeeded(&self, verb: &str) {
        self.notifier.notify(Notification::success(
            "Success",
            format!("{} {} successfully", self.label(), verb),
        ));
    }

    fn failed(&self, verb: &str, error: &ApiError) {
        tracing::warn!(kind = %R::COLLECTION, error = %error, "Failed to {} record", verb);
        self.notifier.notify(Notification::error(
            "Error",
            failure_detail(
                error,
                format!("Failed to {} {}", verb, self.label().to_lowercase()),
            ),
        ));
    }

    async fn cached_list(
        &self,
        key: QueryKey,
        path: String,
        query: Vec<(&'static str, String)>,
    ) -> Result<Arc<Vec<R>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(key, move || async move {
                api.get(&path, &query).await.and_then(decode_list::<R>)
            })
            .await
    }

    /// Every record of this kind. Key `[kind]`.
    pub async fn list(&self) -> Result<Arc<Vec<R>>, ApiError> {
        self.cached_list(QueryKey::collection(R::COLLECTION), self.path().to_string(), Vec::new())
            .await
    }

    /// One page. Key `[kind, "paged", page, size, sort]`.
    ///
    /// Students page under `/students/paged`; other kinds page their
    /// collection path directly.
    pub async fn list_paged(
        &self,
        page: u32,
        size: u32,
        sort: Option<&str>,
    ) -> Result<Arc<Page<R>>, ApiError> {
        let key = QueryKey::collection(R::COLLECTION)
            .with("paged")
            .with(page)
            .with(size)
            .with(sort);

        let path = match R::COLLECTION {
            Collection::Resource(ResourceKind::Students) => format!("{}/paged", self.path()),
            _ => self.path().to_string(),
        };
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(sort) = sort {
            query.push(("sort", sort.to_string()));
        }

        let api = Arc::clone(&self.api);
        self.cache
            .fetch(key, move || async move {
                api.get(&path, &query).await.and_then(decode::<Page<R>>)
            })
            .await
    }

    /// One record. Key `[kind, id]`.
    pub async fn get(&self, id: i64) -> Result<Arc<R>, ApiError> {
        let api = Arc::clone(&self.api);
        let path = self.entity_path(id);
        self.cache
            .fetch(QueryKey::entity(R::COLLECTION, id), move || async move {
                api.get(&path, &[]).await.and_then(decode::<R>)
            })
            .await
    }

    /// Creates a record. On success `[kind]` is marked stale and
    /// `[kind, id]` primed with the server's copy.
    pub async fn create(&self, input: &R::Input) -> Result<R, ApiError> {
        let result = async {
            let body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
            let created = self.api.post(self.path(), Some(body)).await?;
            decode::<R>(created)
        }
        .await;

        match result {
            Ok(record) => {
                self.cache.invalidate(&QueryKey::collection(R::COLLECTION));
                if let Some(id) = record.id() {
                    self.cache
                        .set_query_data(QueryKey::entity(R::COLLECTION, id), record.clone());
                }
                tracing::info!(kind = %R::COLLECTION, id = ?record.id(), "Record created");
                self.succeeded("created");
                Ok(record)
            }
            Err(e) => {
                self.failed("create", &e);
                Err(e)
            }
        }
    }

    /// Replaces a record. On success `[kind, "paged"]` and `[kind, id]`
    /// are marked stale and `[kind, id]` primed. Batch types have no pages
    /// and mark their whole collection stale instead.
    pub async fn update(&self, id: i64, input: &R::Input) -> Result<R, ApiError> {
        let result = async {
            let body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
            let updated = self.api.put(&self.entity_path(id), body).await?;
            decode::<R>(updated)
        }
        .await;

        match result {
            Ok(record) => {
                let entity = QueryKey::entity(R::COLLECTION, id);
                let listings = match R::COLLECTION {
                    Collection::BatchTypes => QueryKey::collection(R::COLLECTION),
                    Collection::Resource(_) => QueryKey::collection(R::COLLECTION).with("paged"),
                };
                self.cache.invalidate(&listings);
                self.cache.invalidate(&entity);
                self.cache.set_query_data(entity, record.clone());
                tracing::info!(kind = %R::COLLECTION, id, "Record updated");
                self.succeeded("updated");
                Ok(record)
            }
            Err(e) => {
                self.failed("update", &e);
                Err(e)
            }
        }
    }

    /// Deletes a record. On success `[kind]` is marked stale and
    /// `[kind, id]` dropped.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        match self.api.delete(&self.entity_path(id)).await {
            Ok(()) => {
                self.cache.invalidate(&QueryKey::collection(R::COLLECTION));
                self.cache.remove_queries(&QueryKey::entity(R::COLLECTION, id));
                tracing::info!(kind = %R::COLLECTION, id, "Record deleted");
                self.succeeded("deleted");
                Ok(())
            }
            Err(e) => {
                self.failed("delete", &e);
                Err(e)
            }
        }
    }
}

impl ResourceService<Student> {
    /// Students of one batch, or all when `batch_id` is `None`.
    /// Key `[students, batch_id]`.
    pub async fn list_by_batch(&self, batch_id: Option<i64>) -> Result<Arc<Vec<Student>>, ApiError> {
        let key = QueryKey::collection(Student::COLLECTION).with(batch_id);
        let query = batch_id
            .map(|id| vec![("batchId", id.to_string())])
            .unwrap_or_default();
        self.cached_list(key, self.path().to_string(), query).await
    }
}

impl ResourceService<Batch> {
    /// Adds a class to a batch. Marks the batch's pages and its own entry stale.
    pub async fn assign_class(&self, batch_id: i64, class_id: i64) -> Result<Option<Batch>, ApiError> {
        let path = format!("{}/classes/{}", self.entity_path(batch_id), class_id);
        let result = self
            .api
            .post(&path, None)
            .await
            .and_then(|value| match value {
                Value::Null => Ok(None),
                other => decode::<Batch>(other).map(Some),
            });

        match result {
            Ok(batch) => {
                self.cache
                    .invalidate(&QueryKey::collection(Batch::COLLECTION).with("paged"));
                self.cache
                    .invalidate(&QueryKey::entity(Batch::COLLECTION, batch_id));
                tracing::info!(batch_id, class_id, "Class assigned to batch");
                self.notifier.notify(Notification::success(
                    "Success",
                    "Class assigned to batch successfully",
                ));
                Ok(batch)
            }
            Err(e) => {
                tracing::warn!(batch_id, class_id, error = %e, "Failed to assign class");
                self.notifier.notify(Notification::error(
                    "Error",
                    failure_detail(&e, "Failed to assign class to batch".to_string()),
                ));
                Err(e)
            }
        }
    }
}

/// One service per collection over a shared cache.
#[derive(Clone)]
pub struct Resources {
    pub students: ResourceService<Student>,
    pub batches: ResourceService<Batch>,
    pub batch_types: ResourceService<BatchType>,
    pub classes: ResourceService<Class>,
    pub mentors: ResourceService<Mentor>,
    pub mentor_sessions: ResourceService<MentorSession>,
}

impl Resources {
    pub fn new(api: Arc<dyn ResourceApi>, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            students: ResourceService::new(Arc::clone(&api), cache.clone(), Arc::clone(&notifier)),
            batches: ResourceService::new(Arc::clone(&api), cache.clone(), Arc::clone(&notifier)),
            batch_types: ResourceService::new(Arc::clone(&api), cache.clone(), Arc::clone(&notifier)),
            classes: ResourceService::new(Arc::clone(&api), cache.clone(), Arc::clone(&notifier)),
            mentors: ResourceService::new(Arc::clone(&api), cache.clone(), Arc::clone(&notifier)),
            mentor_sessions: ResourceService::new(api, cache, notifier),
        }
    }
}
