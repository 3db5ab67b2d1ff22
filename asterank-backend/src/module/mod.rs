pub mod autocomplete;
pub mod catalog;
pub mod ephemeris;
pub mod exoplanets;
pub mod fields;
pub mod rankings;
