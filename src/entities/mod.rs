mod criteria;
mod place;

pub use criteria::{Criteria, CriteriaParams};
pub use place::{decode_photos, NewPlace, Place, PlaceParams, PlaceSummary};

#[cfg(test)]
pub use place::cafe;
