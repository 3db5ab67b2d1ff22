pub mod gateway;
pub mod sbdb;

pub use gateway::{lookup, EphemerisGateway, EphemerisSource, KEY_FIELD};
pub use sbdb::SbdbClient;
