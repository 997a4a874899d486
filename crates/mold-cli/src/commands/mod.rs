pub mod generate;
pub mod info;
pub mod params;
pub mod validate;
