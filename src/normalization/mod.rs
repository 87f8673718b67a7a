pub mod rating;
pub mod tags;
