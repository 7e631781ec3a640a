use serde::{Deserialize, Serialize};

use crate::error::{missing_field_error, Error};

/// A catalog entry as stored and as returned by the full-field endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub district: String,
    pub category: String,
    pub breakfast_time: String,
    pub breakfast_hours: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub website: Option<String>,
    pub price: String,
    pub rating: f64,
    pub description: String,
    pub photos: Vec<String>,
}

/// Public projection served by the random sample endpoint. Location,
/// address, website and description are left out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub id: i64,
    pub name: String,
    pub district: String,
    pub category: String,
    pub breakfast_time: String,
    pub breakfast_hours: Option<String>,
    pub price: String,
    pub rating: f64,
    pub photos: Vec<String>,
}

impl From<&Place> for PlaceSummary {
    fn from(place: &Place) -> Self {
        Self {
            id: place.id,
            name: place.name.clone(),
            district: place.district.clone(),
            category: place.category.clone(),
            breakfast_time: place.breakfast_time.clone(),
            breakfast_hours: place.breakfast_hours.clone(),
            price: place.price.clone(),
            rating: place.rating,
            photos: place.photos.clone(),
        }
    }
}

/// Request body for insert and update. Every field is optional here so that
/// an absent required field is reported by name instead of as a generic
/// deserialization failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlaceParams {
    pub name: Option<String>,
    pub district: Option<String>,
    pub category: Option<String>,
    pub breakfast_time: Option<String>,
    pub breakfast_hours: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub photos: Option<Vec<String>>,
}

/// Every field of a place except its id, with presence already checked.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPlace {
    pub name: String,
    pub district: String,
    pub category: String,
    pub breakfast_time: String,
    pub breakfast_hours: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub website: Option<String>,
    pub price: String,
    pub rating: f64,
    pub description: String,
    pub photos: Vec<String>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

impl TryFrom<PlaceParams> for NewPlace {
    type Error = Error;

    fn try_from(params: PlaceParams) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required(params.name, "name")?,
            district: required(params.district, "district")?,
            category: required(params.category, "category")?,
            breakfast_time: required(params.breakfast_time, "breakfast_time")?,
            breakfast_hours: params.breakfast_hours,
            lat: required(params.lat, "lat")?,
            lng: required(params.lng, "lng")?,
            address: required(params.address, "address")?,
            website: params.website,
            price: required(params.price, "price")?,
            rating: required(params.rating, "rating")?,
            description: params.description.unwrap_or_default(),
            photos: params.photos.unwrap_or_default(),
        })
    }
}

/// Decodes the stored `photos` text. Anything that is not a JSON array of
/// strings yields an empty list.
pub fn decode_photos(raw: Option<&str>) -> Vec<String> {
    let text = match raw.map(str::trim) {
        None | Some("") | Some("null") => return Vec::new(),
        Some(text) => text,
    };

    match serde_json::from_str::<Vec<String>>(text) {
        Ok(photos) => photos,
        Err(err) => {
            tracing::warn!(error = %err, "discarding undecodable photos value");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub fn cafe(id: i64) -> Place {
    Place {
        id,
        name: format!("Cafe {id}"),
        district: "Center".into(),
        category: "coffee".into(),
        breakfast_time: "morning".into(),
        breakfast_hours: Some("8:00-12:00".into()),
        lat: 55.75,
        lng: 37.61,
        address: "X St".into(),
        website: Some("https://example.com".into()),
        price: "400 ₽".into(),
        rating: 4.5,
        description: "pancakes".into(),
        photos: vec!["a.jpg".into()],
    }
}

#[test]
fn photos_decode_in_order() {
    assert_eq!(
        decode_photos(Some(r#"["a.jpg","b.jpg"]"#)),
        vec!["a.jpg".to_string(), "b.jpg".to_string()]
    );
}

#[test]
fn malformed_photos_degrade_to_empty() {
    assert!(decode_photos(None).is_empty());
    assert!(decode_photos(Some("")).is_empty());
    assert!(decode_photos(Some("  null ")).is_empty());
    assert!(decode_photos(Some("not json")).is_empty());
    assert!(decode_photos(Some(r#"{"a": 1}"#)).is_empty());
    assert!(decode_photos(Some(r#"["a.jpg", 3]"#)).is_empty());
}

#[test]
fn missing_required_field_is_named() {
    let params = PlaceParams {
        name: Some("Cafe A".into()),
        district: Some("Center".into()),
        category: Some("coffee".into()),
        breakfast_time: Some("morning".into()),
        lat: Some(1.0),
        lng: Some(2.0),
        address: Some("X St".into()),
        rating: Some(4.5),
        ..Default::default()
    };

    let err = NewPlace::try_from(params).unwrap_err();
    assert_eq!(err.code, 101);
    assert_eq!(err.message, "missing required field: price");
}

#[test]
fn optional_fields_take_defaults() {
    let params: PlaceParams = serde_json::from_value(serde_json::json!({
        "name": "Cafe A",
        "district": "Center",
        "category": "coffee",
        "breakfast_time": "morning",
        "lat": 1.0,
        "lng": 2.0,
        "address": "X St",
        "price": "400 ₽",
        "rating": 4.5
    }))
    .unwrap();

    let place = NewPlace::try_from(params).unwrap();
    assert_eq!(place.breakfast_hours, None);
    assert_eq!(place.website, None);
    assert_eq!(place.description, "");
    assert!(place.photos.is_empty());
}

#[test]
fn summary_omits_location_and_contact_fields() {
    let value = serde_json::to_value(PlaceSummary::from(&cafe(1))).unwrap();
    let object = value.as_object().unwrap();

    for field in ["lat", "lng", "address", "website", "description"] {
        assert!(!object.contains_key(field), "{field} leaked");
    }
    assert_eq!(object.len(), 9);
}
