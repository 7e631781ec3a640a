use super::Engine;

use async_trait::async_trait;

use crate::{
    api::DiscoveryAPI,
    db::PlaceStore,
    entities::{Criteria, Place, PlaceSummary},
    error::Error,
    query,
};

#[async_trait]
impl<S: PlaceStore + Send + Sync> DiscoveryAPI for Engine<S> {
    #[tracing::instrument(skip(self))]
    async fn random_places(&self, count: usize) -> Result<Vec<PlaceSummary>, Error> {
        let places = self.store.load_all().await?;

        Ok(query::pick_random(&places, count, &mut rand::thread_rng()))
    }

    #[tracing::instrument(skip(self))]
    async fn random_match(&self, criteria: Criteria) -> Result<Place, Error> {
        let places = self.store.load_all().await?;

        query::pick_random_match(&places, &criteria, &mut rand::thread_rng())
    }
}

#[test]
fn random_places_samples_stored_catalog() {
    use crate::db::{new_place, temp_store};
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;
        for name in ["A", "B", "C", "D", "E"] {
            store.insert(&new_place(name)).await.unwrap();
        }
        let engine = Engine::new(store).await.unwrap();

        assert_eq!(engine.random_places(3).await.unwrap().len(), 3);
        assert_eq!(engine.random_places(50).await.unwrap().len(), 5);
    });
}

#[test]
fn random_match_filters_stored_catalog() {
    use crate::db::{new_place, temp_store};
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let mut north = new_place("North Cafe");
        north.district = "North".into();
        store.insert(&north).await.unwrap();
        store.insert(&new_place("Center Cafe")).await.unwrap();

        let engine = Engine::new(store).await.unwrap();

        let criteria = Criteria {
            district: Some("North".into()),
            ..Default::default()
        };
        assert_eq!(engine.random_match(criteria).await.unwrap().name, "North Cafe");

        let criteria = Criteria {
            min_rating: Some(4.9),
            ..Default::default()
        };
        assert_eq!(engine.random_match(criteria).await.unwrap_err().code, 105);
    });
}
