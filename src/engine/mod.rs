mod catalog_api;
mod discovery_api;

use crate::{api::API, db::PlaceStore, error::Error};

pub struct Engine<S> {
    store: S,
}

impl<S: PlaceStore> Engine<S> {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(store: S) -> Result<Self, Error> {
        store.initialize().await?;

        Ok(Self { store })
    }
}

impl<S: PlaceStore + Send + Sync> API for Engine<S> {}
