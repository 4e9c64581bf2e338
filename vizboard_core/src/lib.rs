// vizboard_core/src/lib.rs

// This file defines the public modules of the library.
pub mod error;
pub mod frames;
pub mod mapping;
pub mod markers;
pub mod messages;
pub mod poses;
pub mod prelude;
pub mod render;
pub mod types;
pub mod waypoints;
