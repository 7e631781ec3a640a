//! Filtering and random selection over a fully loaded catalog.
//!
//! Every call works on the complete list of places handed in by the caller,
//! so cost grows linearly with the catalog. That is fine for a few thousand
//! rows; anything larger wants filtering pushed down into the store.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::entities::{Criteria, Place, PlaceSummary};
use crate::error::{no_match_error, Error};

pub const DEFAULT_SAMPLE_SIZE: usize = 3;

/// Returns `count` distinct places chosen uniformly at random, projected to
/// their public summary. When `count` covers the whole catalog every place is
/// returned in source order.
pub fn pick_random<R: Rng + ?Sized>(
    places: &[Place],
    count: usize,
    rng: &mut R,
) -> Vec<PlaceSummary> {
    if count >= places.len() {
        return places.iter().map(PlaceSummary::from).collect();
    }

    places
        .choose_multiple(rng, count)
        .map(PlaceSummary::from)
        .collect()
}

/// Returns one place, with all fields, chosen uniformly at random among
/// those satisfying every active filter.
pub fn pick_random_match<R: Rng + ?Sized>(
    places: &[Place],
    criteria: &Criteria,
    rng: &mut R,
) -> Result<Place, Error> {
    let candidates: Vec<&Place> = places.iter().filter(|p| criteria.matches(p)).collect();

    tracing::debug!(
        total = places.len(),
        candidates = candidates.len(),
        "filtered places"
    );

    candidates
        .choose(rng)
        .map(|&place| place.clone())
        .ok_or_else(no_match_error)
}

/// Reads a free-form price such as `"1 500 ₽"` as a number. Currency signs
/// and whitespace are dropped; whatever remains must be plain digits.
/// Ranges and text yield `None`.
pub fn normalize_price(price: &str) -> Option<i64> {
    let digits: String = price
        .chars()
        .filter(|c| *c != '₽' && !c.is_whitespace())
        .collect();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

impl Criteria {
    pub fn matches(&self, place: &Place) -> bool {
        if let Some(district) = &self.district {
            if &place.district != district {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if &place.category != category {
                return false;
            }
        }

        if let Some(breakfast_time) = &self.breakfast_time {
            if &place.breakfast_time != breakfast_time {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            // unreadable prices never satisfy a price ceiling
            match normalize_price(&place.price) {
                Some(price) if price <= max_price => (),
                _ => return false,
            }
        }

        if let Some(min_rating) = self.min_rating {
            if place.rating < min_rating {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
fn seeded() -> rand::rngs::StdRng {
    use rand::SeedableRng;

    rand::rngs::StdRng::seed_from_u64(7)
}

#[cfg(test)]
fn catalog(len: i64) -> Vec<Place> {
    (1..=len).map(crate::entities::cafe).collect()
}

#[test]
fn sample_returns_distinct_places_from_source() {
    use std::collections::HashSet;

    let places = catalog(10);
    let mut rng = seeded();

    for count in 0..=10 {
        let picked = pick_random(&places, count, &mut rng);
        let ids: HashSet<i64> = picked.iter().map(|p| p.id).collect();

        assert_eq!(picked.len(), count);
        assert_eq!(ids.len(), count);
        assert!(ids.iter().all(|id| (1..=10).contains(id)));
    }
}

#[test]
fn oversized_sample_returns_everything_in_order() {
    let places = catalog(4);

    let picked = pick_random(&places, 10, &mut seeded());

    let ids: Vec<i64> = picked.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn sample_of_empty_catalog_is_empty() {
    assert!(pick_random(&[], DEFAULT_SAMPLE_SIZE, &mut seeded()).is_empty());
}

#[test]
fn price_normalization() {
    assert_eq!(normalize_price("300 ₽"), Some(300));
    assert_eq!(normalize_price("₽500"), Some(500));
    assert_eq!(normalize_price("1 500 ₽"), Some(1500));
    assert_eq!(normalize_price("not a number"), None);
    assert_eq!(normalize_price("300-500 ₽"), None);
    assert_eq!(normalize_price("-300"), None);
    assert_eq!(normalize_price("₽"), None);
    assert_eq!(normalize_price(""), None);
}

#[test]
fn price_ceiling_excludes_unreadable_prices() {
    let mut cheap = crate::entities::cafe(1);
    cheap.price = "300 ₽".into();
    let mut unknown = crate::entities::cafe(2);
    unknown.price = "not a number".into();

    let with_ceiling = Criteria {
        max_price: Some(500),
        ..Default::default()
    };
    assert!(with_ceiling.matches(&cheap));
    assert!(!with_ceiling.matches(&unknown));

    assert!(Criteria::default().matches(&unknown));

    let places = vec![unknown, cheap];
    for _ in 0..20 {
        let picked = pick_random_match(&places, &with_ceiling, &mut seeded()).unwrap();
        assert_eq!(picked.id, 1);
    }
}

#[test]
fn every_match_satisfies_all_filters() {
    let mut places = catalog(30);
    for (i, place) in places.iter_mut().enumerate() {
        place.district = ["Center", "North", "South"][i % 3].into();
        place.category = ["coffee", "bakery"][i % 2].into();
        place.price = format!("{} ₽", 100 * (i % 7));
        place.rating = (i % 5) as f64;
    }

    let criteria = Criteria {
        district: Some("North".into()),
        category: Some("bakery".into()),
        breakfast_time: Some("morning".into()),
        max_price: Some(400),
        min_rating: Some(2.0),
    };

    let mut rng = seeded();
    for _ in 0..50 {
        let place = pick_random_match(&places, &criteria, &mut rng).unwrap();
        assert_eq!(place.district, "North");
        assert_eq!(place.category, "bakery");
        assert!(normalize_price(&place.price).unwrap() <= 400);
        assert!(place.rating >= 2.0);
    }
}

#[test]
fn rating_floor_is_inclusive() {
    let place = crate::entities::cafe(1);
    let criteria = Criteria {
        min_rating: Some(4.5),
        ..Default::default()
    };

    assert!(criteria.matches(&place));
}

#[test]
fn no_candidates_is_a_not_found_error() {
    let criteria = Criteria {
        district: Some("Nowhere".into()),
        ..Default::default()
    };

    let err = pick_random_match(&catalog(5), &criteria, &mut seeded()).unwrap_err();
    assert_eq!(err.code, 105);

    let err = pick_random_match(&[], &Criteria::default(), &mut seeded()).unwrap_err();
    assert_eq!(err.code, 105);
}

#[test]
fn large_catalog_is_scanned_in_full() {
    // full load then linear scan; this is the scale ceiling of the design
    let mut places = catalog(5000);
    places[4321].district = "Outskirts".into();

    let criteria = Criteria {
        district: Some("Outskirts".into()),
        ..Default::default()
    };

    let place = pick_random_match(&places, &criteria, &mut seeded()).unwrap();
    assert_eq!(place.id, 4322);
}
