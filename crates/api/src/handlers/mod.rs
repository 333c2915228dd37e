pub mod admin;
pub mod records;
pub mod tracking;
