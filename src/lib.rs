pub mod error;
pub mod numeric;
pub mod polarization;
pub mod statistics;
pub mod summary;
pub mod trajectory;
