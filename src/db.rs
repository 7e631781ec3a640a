use std::path::Path;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, FromRow, Pool, Sqlite,
};

use crate::entities::{decode_photos, NewPlace, Place};
use crate::error::Error;

// no query capability beyond loading everything; filtering happens in-process
#[async_trait]
pub trait PlaceStore {
    async fn initialize(&self) -> Result<(), Error>;

    async fn load_all(&self) -> Result<Vec<Place>, Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Place>, Error>;

    async fn insert(&self, place: &NewPlace) -> Result<i64, Error>;

    // zero rows affected for an unknown id
    async fn update_by_id(&self, id: i64, place: &NewPlace) -> Result<u64, Error>;

    async fn delete_by_id(&self, id: i64) -> Result<u64, Error>;
}

const CREATE_PLACES: &str = "
    CREATE TABLE IF NOT EXISTS places (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        district TEXT NOT NULL,
        category TEXT NOT NULL,
        breakfast_time TEXT NOT NULL,
        breakfast_hours TEXT,
        lat REAL NOT NULL,
        lng REAL NOT NULL,
        address TEXT NOT NULL,
        website TEXT,
        price TEXT NOT NULL,
        rating REAL NOT NULL,
        description TEXT,
        photos TEXT NOT NULL DEFAULT '[]'
    )";

const SELECT_PLACES: &str = "
    SELECT id, name, district, category, breakfast_time, breakfast_hours,
           lat, lng, address, website, price, rating, description, photos
    FROM places";

#[derive(FromRow)]
struct PlaceRow {
    id: i64,
    name: String,
    district: String,
    category: String,
    breakfast_time: String,
    breakfast_hours: Option<String>,
    lat: f64,
    lng: f64,
    address: String,
    website: Option<String>,
    price: String,
    rating: Option<f64>,
    description: Option<String>,
    photos: Option<String>,
}

impl From<PlaceRow> for Place {
    fn from(row: PlaceRow) -> Self {
        let photos = decode_photos(row.photos.as_deref());

        Self {
            id: row.id,
            name: row.name,
            district: row.district,
            category: row.category,
            breakfast_time: row.breakfast_time,
            breakfast_hours: row.breakfast_hours,
            lat: row.lat,
            lng: row.lng,
            address: row.address,
            website: row.website,
            price: row.price,
            rating: row.rating.unwrap_or(0.0),
            description: row.description.unwrap_or_default(),
            photos,
        }
    }
}

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database file at `path`.
    pub async fn new(path: &Path, max_connections: u32) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl PlaceStore for SqliteStore {
    #[tracing::instrument(skip(self))]
    async fn initialize(&self) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(CREATE_PLACES).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn load_all(&self) -> Result<Vec<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<PlaceRow> = sqlx::query_as(SELECT_PLACES).fetch_all(&mut conn).await?;

        Ok(rows.into_iter().map(Place::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row: Option<PlaceRow> = sqlx::query_as(&format!("{SELECT_PLACES} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut conn)
            .await?;

        Ok(maybe_row.map(Place::from))
    }

    #[tracing::instrument(skip(self, place), fields(name = %place.name))]
    async fn insert(&self, place: &NewPlace) -> Result<i64, Error> {
        let photos = serde_json::to_string(&place.photos)?;
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO places
                    (name, district, category, breakfast_time, breakfast_hours, lat, lng,
                     address, website, price, rating, description, photos)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&place.name)
                .bind(&place.district)
                .bind(&place.category)
                .bind(&place.breakfast_time)
                .bind(&place.breakfast_hours)
                .bind(place.lat)
                .bind(place.lng)
                .bind(&place.address)
                .bind(&place.website)
                .bind(&place.price)
                .bind(place.rating)
                .bind(&place.description)
                .bind(photos),
            )
            .await?;

        Ok(result.last_insert_rowid())
    }

    #[tracing::instrument(skip(self, place))]
    async fn update_by_id(&self, id: i64, place: &NewPlace) -> Result<u64, Error> {
        let photos = serde_json::to_string(&place.photos)?;
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "UPDATE places SET
                    name = ?, district = ?, category = ?, breakfast_time = ?, breakfast_hours = ?,
                    lat = ?, lng = ?, address = ?, website = ?, price = ?, rating = ?,
                    description = ?, photos = ?
                    WHERE id = ?",
                )
                .bind(&place.name)
                .bind(&place.district)
                .bind(&place.category)
                .bind(&place.breakfast_time)
                .bind(&place.breakfast_hours)
                .bind(place.lat)
                .bind(place.lng)
                .bind(&place.address)
                .bind(&place.website)
                .bind(&place.price)
                .bind(place.rating)
                .bind(&place.description)
                .bind(photos)
                .bind(id),
            )
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: i64) -> Result<u64, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(sqlx::query("DELETE FROM places WHERE id = ?").bind(id))
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
pub async fn temp_store(dir: &tempfile::TempDir) -> SqliteStore {
    let store = SqliteStore::new(&dir.path().join("mellmap.db"), 1)
        .await
        .unwrap();
    store.initialize().await.unwrap();
    store
}

#[cfg(test)]
pub fn new_place(name: &str) -> NewPlace {
    NewPlace {
        name: name.into(),
        district: "Center".into(),
        category: "coffee".into(),
        breakfast_time: "morning".into(),
        breakfast_hours: None,
        lat: 1.0,
        lng: 2.0,
        address: "X St".into(),
        website: None,
        price: "400 ₽".into(),
        rating: 4.5,
        description: String::new(),
        photos: vec![],
    }
}

#[test]
fn initialize_is_idempotent() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        store.insert(&new_place("Cafe A")).await.unwrap();
        store.initialize().await.unwrap();

        assert_eq!(store.load_all().await.unwrap().len(), 1);
    });
}

#[test]
fn insert_assigns_ids_and_round_trips_photos() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let mut place = new_place("Cafe A");
        place.photos = vec!["a.jpg".into(), "b.jpg".into()];
        place.website = Some("https://cafe-a.example".into());

        let first = store.insert(&place).await.unwrap();
        let second = store.insert(&new_place("Cafe B")).await.unwrap();
        assert_ne!(first, second);

        let loaded = store.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(loaded.photos, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(loaded.website.as_deref(), Some("https://cafe-a.example"));
        assert_eq!(loaded.price, "400 ₽");

        let all = store.load_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(all[1].photos.is_empty());
    });
}

#[test]
fn corrupt_photos_load_as_empty() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let empty = store.insert(&new_place("Empty")).await.unwrap();
        let broken = store.insert(&new_place("Broken")).await.unwrap();

        let mut conn = store.pool.acquire().await.unwrap();
        conn.execute(sqlx::query("UPDATE places SET photos = '' WHERE id = ?").bind(empty))
            .await
            .unwrap();
        conn.execute(sqlx::query("UPDATE places SET photos = '[oops' WHERE id = ?").bind(broken))
            .await
            .unwrap();
        drop(conn);

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.photos.is_empty()));
    });
}

#[test]
fn null_description_loads_as_empty() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let mut place = new_place("Cafe A");
        place.description = "waffles".into();
        let id = store.insert(&place).await.unwrap();

        let mut conn = store.pool.acquire().await.unwrap();
        conn.execute(sqlx::query("UPDATE places SET description = NULL WHERE id = ?").bind(id))
            .await
            .unwrap();
        drop(conn);

        let all = store.load_all().await.unwrap();
        assert_eq!(all[0].description, "");
    });
}

#[test]
fn null_rating_from_foreign_schema_loads_as_zero() {
    use crate::entities::Criteria;
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(&dir.path().join("legacy.db"), 1)
            .await
            .unwrap();

        // table created elsewhere, without the NOT NULL constraint on rating
        let mut conn = store.pool.acquire().await.unwrap();
        conn.execute(
            "CREATE TABLE places (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL, district TEXT NOT NULL, category TEXT NOT NULL,
                breakfast_time TEXT NOT NULL, breakfast_hours TEXT,
                lat REAL NOT NULL, lng REAL NOT NULL, address TEXT NOT NULL,
                website TEXT, price TEXT NOT NULL, rating REAL,
                description TEXT, photos TEXT
            )",
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO places (name, district, category, breakfast_time, lat, lng, address, price)
             VALUES ('Old Cafe', 'Center', 'coffee', 'morning', 1.0, 2.0, 'X St', '300 ₽')",
        )
        .await
        .unwrap();
        drop(conn);

        store.initialize().await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rating, 0.0);
        assert_eq!(all[0].description, "");
        assert!(all[0].photos.is_empty());

        let criteria = Criteria {
            min_rating: Some(0.0),
            ..Default::default()
        };
        assert!(criteria.matches(&all[0]));
    });
}

#[test]
fn update_overwrites_every_field() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let mut original = new_place("Cafe A");
        original.description = "old".into();
        original.breakfast_hours = Some("9-11".into());
        let id = store.insert(&original).await.unwrap();

        let mut replacement = new_place("Cafe A2");
        replacement.district = "North".into();
        replacement.rating = 3.0;
        replacement.photos = vec!["c.jpg".into()];

        assert_eq!(store.update_by_id(id, &replacement).await.unwrap(), 1);

        let loaded = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Cafe A2");
        assert_eq!(loaded.district, "North");
        assert_eq!(loaded.rating, 3.0);
        assert_eq!(loaded.description, "");
        assert_eq!(loaded.breakfast_hours, None);
        assert_eq!(loaded.photos, vec!["c.jpg".to_string()]);
    });
}

#[test]
fn missing_ids_are_silent_no_ops() {
    use tokio_test::block_on;

    block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir).await;

        let id = store.insert(&new_place("Cafe A")).await.unwrap();

        assert_eq!(store.update_by_id(id + 100, &new_place("Ghost")).await.unwrap(), 0);
        assert_eq!(store.delete_by_id(id + 100).await.unwrap(), 0);
        assert_eq!(store.load_all().await.unwrap().len(), 1);

        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(store.find_by_id(id).await.unwrap().is_none());
    });
}
