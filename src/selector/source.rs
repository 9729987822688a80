//! Data providers a selector can fetch from

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::Result;

/// Asynchronous provider of a selector's candidate items.
///
/// `key` is the caller's refetch key (e.g. "doctors of department X");
/// `None` means the unparameterized collection.
#[async_trait]
pub trait ItemSource<T, K = ()>: Send + Sync
where
    T: Send,
    K: Sync,
{
    async fn fetch(&self, key: Option<&K>) -> Result<Vec<T>>;
}

/// Adapts an async closure into an [`ItemSource`].
///
/// ```ignore
/// let doctors = FnSource::new(move |dept: Option<i64>| {
///     let staff = staff.clone();
///     async move { staff.filter_by("department", dept.unwrap_or_default()).await }
/// });
/// ```
pub struct FnSource<F, K> {
    f: F,
    _key: PhantomData<fn(K)>,
}

impl<F, K> FnSource<F, K> {
    pub fn new(f: F) -> Self {
        Self { f, _key: PhantomData }
    }
}

#[async_trait]
impl<T, K, F, Fut> ItemSource<T, K> for FnSource<F, K>
where
    T: Send,
    K: Clone + Send + Sync,
    F: Fn(Option<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    async fn fetch(&self, key: Option<&K>) -> Result<Vec<T>> {
        (self.f)(key.cloned()).await
    }
}
