//! Reusable view components.

pub mod geo_map;
