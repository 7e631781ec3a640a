use super::Engine;

use async_trait::async_trait;

use crate::{
    api::CatalogAPI,
    db::PlaceStore,
    entities::{NewPlace, Place},
    error::{not_found_error, Error},
};

#[async_trait]
impl<S: PlaceStore + Send + Sync> CatalogAPI for Engine<S> {
    #[tracing::instrument(skip(self))]
    async fn list_places(&self) -> Result<Vec<Place>, Error> {
        self.store.load_all().await
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: i64) -> Result<Place, Error> {
        let maybe_place = self.store.find_by_id(id).await?;

        maybe_place.ok_or_else(not_found_error)
    }

    #[tracing::instrument(skip(self, place), fields(name = %place.name))]
    async fn create_place(&self, place: NewPlace) -> Result<i64, Error> {
        let id = self.store.insert(&place).await?;

        tracing::info!(id, "place created");

        Ok(id)
    }

    #[tracing::instrument(skip(self, place))]
    async fn update_place(&self, id: i64, place: NewPlace) -> Result<u64, Error> {
        let rows_affected = self.store.update_by_id(id, &place).await?;

        // an unknown id is not an error
        tracing::debug!(rows_affected, "place updated");

        Ok(rows_affected)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_place(&self, id: i64) -> Result<u64, Error> {
        let rows_affected = self.store.delete_by_id(id).await?;

        tracing::debug!(rows_affected, "place deleted");

        Ok(rows_affected)
    }
}

#[test]
fn find_place_reports_missing_ids() {
    use crate::db::{new_place, temp_store};
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(temp_store(&dir).await).await.unwrap();

        let id = engine.create_place(new_place("Cafe A")).await.unwrap();

        assert_eq!(engine.find_place(id).await.unwrap().name, "Cafe A");
        assert_eq!(engine.find_place(id + 1).await.unwrap_err().code, 104);
    });
}

#[test]
fn update_and_delete_report_affected_rows() {
    use crate::db::{new_place, temp_store};
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(temp_store(&dir).await).await.unwrap();

        let id = engine.create_place(new_place("Cafe A")).await.unwrap();

        assert_eq!(engine.update_place(id, new_place("Cafe B")).await.unwrap(), 1);
        assert_eq!(engine.update_place(id + 9, new_place("Cafe C")).await.unwrap(), 0);
        assert_eq!(engine.list_places().await.unwrap()[0].name, "Cafe B");

        assert_eq!(engine.delete_place(id + 9).await.unwrap(), 0);
        assert_eq!(engine.delete_place(id).await.unwrap(), 1);
        assert!(engine.list_places().await.unwrap().is_empty());
    });
}
