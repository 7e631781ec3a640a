use serde::{Deserialize, Serialize};

/// Raw query string of the random-match endpoint. Values are kept as text so
/// that an unparseable bound disables its filter instead of failing the
/// request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CriteriaParams {
    pub district: Option<String>,
    pub category: Option<String>,
    pub breakfast_time: Option<String>,
    pub max_price: Option<String>,
    pub min_rating: Option<String>,
}

/// Active random-match filters, combined with logical AND. `None` means the
/// filter is inactive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    pub district: Option<String>,
    pub category: Option<String>,
    pub breakfast_time: Option<String>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
}

impl From<CriteriaParams> for Criteria {
    fn from(params: CriteriaParams) -> Self {
        Self {
            district: non_empty(params.district),
            category: non_empty(params.category),
            breakfast_time: non_empty(params.breakfast_time),
            max_price: number(params.max_price, "max_price"),
            min_rating: number(params.min_rating, "min_rating"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn number<T: std::str::FromStr>(value: Option<String>, name: &str) -> Option<T> {
    let value = non_empty(value)?;

    match value.trim().parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!(parameter = name, value = %value, "ignoring unparseable filter");
            None
        }
    }
}

#[test]
fn empty_and_malformed_values_disable_filters() {
    let criteria = Criteria::from(CriteriaParams {
        district: Some("".into()),
        category: Some("coffee".into()),
        breakfast_time: None,
        max_price: Some("cheap".into()),
        min_rating: Some("".into()),
    });

    assert_eq!(
        criteria,
        Criteria {
            category: Some("coffee".into()),
            ..Default::default()
        }
    );
}

#[test]
fn numeric_bounds_are_parsed() {
    let criteria = Criteria::from(CriteriaParams {
        max_price: Some("500".into()),
        min_rating: Some("4.2".into()),
        ..Default::default()
    });

    assert_eq!(criteria.max_price, Some(500));
    assert_eq!(criteria.min_rating, Some(4.2));
}
