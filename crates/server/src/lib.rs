//! Carbon recommender service
//!
//! Loads the instance dataset once, builds the distance index, and serves
//! recommendation and savings queries over HTTP.

pub mod api;
pub mod config;
