//! Read side - which records a view shows

pub mod filter;

pub use filter::RecordFilter;
