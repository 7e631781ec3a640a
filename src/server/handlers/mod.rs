pub mod assets;
pub mod places;
