pub mod business;
pub mod schedule;
