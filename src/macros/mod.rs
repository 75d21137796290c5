//! Declarative macros for entity declarations and parameter maps.

mod entity;
mod params;
