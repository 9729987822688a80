//! Generic CRUD access to backend collections

use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::http::ApiClient;
use crate::error::Result;
use crate::selector::{dedup_by_id, ItemSource, SelectItem};
use crate::types::{
    CareEvent, Consultation, Department, Derivation, GuardShift, Id, Medication, Patient,
    Referral, Staff, WarehouseRequest,
};

/// A backend collection mounted at `/{PATH}`
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const PATH: &'static str;
}

impl Entity for Patient {
    const PATH: &'static str = "patients";
}
impl Entity for Department {
    const PATH: &'static str = "departments";
}
impl Entity for Staff {
    const PATH: &'static str = "users";
}
impl Entity for Derivation {
    const PATH: &'static str = "derivations";
}
impl Entity for Referral {
    const PATH: &'static str = "referrals";
}
impl Entity for Consultation {
    const PATH: &'static str = "consultations";
}
impl Entity for GuardShift {
    const PATH: &'static str = "guard-shifts";
}
impl Entity for CareEvent {
    const PATH: &'static str = "care-events";
}
impl Entity for Medication {
    const PATH: &'static str = "medications";
}
impl Entity for WarehouseRequest {
    const PATH: &'static str = "warehouse-requests";
}

/// CRUD and search calls for one entity type
pub struct Resource<E> {
    client: ApiClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Resource<E> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn item_path(id: Id) -> String {
        format!("{}/{}", E::PATH, id)
    }

    pub async fn get_all(&self) -> Result<Vec<E>> {
        self.client.get(E::PATH).await
    }

    pub async fn get_by_id(&self, id: Id) -> Result<E> {
        self.client.get(&Self::item_path(id)).await
    }

    pub async fn create<P: Serialize + Sync + ?Sized>(&self, payload: &P) -> Result<E> {
        self.client.post(E::PATH, payload).await
    }

    pub async fn update<P: Serialize + Sync + ?Sized>(&self, id: Id, payload: &P) -> Result<()> {
        self.client.put(&Self::item_path(id), payload).await
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(&Self::item_path(id)).await
    }

    /// `GET /{path}/search/{field}/{term}`
    pub async fn search(&self, field: &str, term: &str) -> Result<Vec<E>> {
        let path = format!("{}/search/{}/{}", E::PATH, field, urlencoding::encode(term));
        self.client.get(&path).await
    }

    /// `GET /{path}/{field}/{value}`, e.g. consultations of one patient
    pub async fn filter_by(&self, field: &str, value: impl Display) -> Result<Vec<E>> {
        let value = value.to_string();
        let path = format!("{}/{}/{}", E::PATH, field, urlencoding::encode(&value));
        self.client.get(&path).await
    }
}

impl<E: Entity + SelectItem> Resource<E> {
    /// Run each search variant in turn and merge the results, dropping
    /// entities already returned by an earlier variant.
    pub async fn search_dedup(&self, fields: &[&str], term: &str) -> Result<Vec<E>> {
        let mut merged = Vec::new();
        for field in fields {
            merged.extend(self.search(field, term).await?);
        }
        Ok(dedup_by_id(merged))
    }
}

#[async_trait]
impl<E: Entity> ItemSource<E> for Resource<E> {
    async fn fetch(&self, _key: Option<&()>) -> Result<Vec<E>> {
        self.get_all().await
    }
}

/// Collection filtered server-side by a foreign key supplied as the
/// selector's refetch key. Without a key the whole collection is fetched.
pub struct KeyedResource<E> {
    resource: Resource<E>,
    field: &'static str,
}

impl<E: Entity> KeyedResource<E> {
    pub fn new(resource: Resource<E>, field: &'static str) -> Self {
        Self { resource, field }
    }
}

#[async_trait]
impl<E: Entity> ItemSource<E, Id> for KeyedResource<E> {
    async fn fetch(&self, key: Option<&Id>) -> Result<Vec<E>> {
        match key {
            Some(id) => self.resource.filter_by(self.field, id).await,
            None => self.resource.get_all().await,
        }
    }
}
