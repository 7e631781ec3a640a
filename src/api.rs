use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Criteria, NewPlace, Place, PlaceSummary};
use crate::error::Error;

#[async_trait]
pub trait CatalogAPI {
    async fn list_places(&self) -> Result<Vec<Place>, Error>;

    async fn find_place(&self, id: i64) -> Result<Place, Error>;

    async fn create_place(&self, place: NewPlace) -> Result<i64, Error>;

    async fn update_place(&self, id: i64, place: NewPlace) -> Result<u64, Error>;

    async fn delete_place(&self, id: i64) -> Result<u64, Error>;
}

#[async_trait]
pub trait DiscoveryAPI {
    async fn random_places(&self, count: usize) -> Result<Vec<PlaceSummary>, Error>;

    async fn random_match(&self, criteria: Criteria) -> Result<Place, Error>;
}

pub trait API: CatalogAPI + DiscoveryAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
