use async_trait::async_trait;
use axum::extract::{Extension, FromRequest, Json, Path, Query, RequestParts};
use serde::{Deserialize, Serialize};

use crate::entities::{CriteriaParams, NewPlace, Place, PlaceParams, PlaceSummary};
use crate::error::{not_found_error, Error};
use crate::query::DEFAULT_SAMPLE_SIZE;
use crate::server::DynAPI;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "ok".into(),
            id: None,
        }
    }

    fn created(id: i64) -> Self {
        Self {
            status: "ok".into(),
            id: Some(id),
        }
    }
}

/// Path id of a place. A segment that is not an integer cannot name a place,
/// so it is answered like an unknown id.
pub struct PlaceId(i64);

#[async_trait]
impl<B: Send> FromRequest<B> for PlaceId {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request(req).await.map_err(|rejection| {
            tracing::debug!(%rejection, "unparseable place id");
            not_found_error()
        })?;

        Ok(Self(id))
    }
}

#[derive(Serialize, Deserialize)]
pub struct RandomParams {
    count: Option<String>,
}

impl RandomParams {
    fn count(&self) -> usize {
        match self.count.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_SAMPLE_SIZE,
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(value, "ignoring unparseable count");
                DEFAULT_SAMPLE_SIZE
            }),
        }
    }
}

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<Place>>, Error> {
    let places = api.list_places().await?;

    Ok(places.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    PlaceId(id): PlaceId,
) -> Result<Json<Place>, Error> {
    let place = api.find_place(id).await?;

    Ok(place.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<PlaceParams>,
) -> Result<Json<StatusResponse>, Error> {
    let place = NewPlace::try_from(params)?;
    let id = api.create_place(place).await?;

    Ok(StatusResponse::created(id).into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    PlaceId(id): PlaceId,
    Json(params): Json<PlaceParams>,
) -> Result<Json<StatusResponse>, Error> {
    let place = NewPlace::try_from(params)?;
    api.update_place(id, place).await?;

    Ok(StatusResponse::ok().into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    PlaceId(id): PlaceId,
) -> Result<Json<StatusResponse>, Error> {
    api.delete_place(id).await?;

    Ok(StatusResponse::ok().into())
}

pub async fn random(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<RandomParams>,
) -> Result<Json<Vec<PlaceSummary>>, Error> {
    let places = api.random_places(params.count()).await?;

    Ok(places.into())
}

pub async fn random_match(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<CriteriaParams>,
) -> Result<Json<Place>, Error> {
    let place = api.random_match(params.into()).await?;

    Ok(place.into())
}

#[test]
fn count_falls_back_to_default() {
    let count = |value: Option<&str>| {
        RandomParams {
            count: value.map(String::from),
        }
        .count()
    };

    assert_eq!(count(None), 3);
    assert_eq!(count(Some("")), 3);
    assert_eq!(count(Some("abc")), 3);
    assert_eq!(count(Some("-1")), 3);
    assert_eq!(count(Some("0")), 0);
    assert_eq!(count(Some("7")), 7);
}
