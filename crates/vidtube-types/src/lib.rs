//! Shared data types: stored entities, read-model views and HTTP DTOs.

pub mod api;
pub mod models;
pub mod views;
