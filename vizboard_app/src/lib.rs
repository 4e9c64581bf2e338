// vizboard_app/src/lib.rs

// The dashboard runtime: feeds, widgets and the event loop that drives them.
pub mod binding;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod discovery;
pub mod error;
pub mod input;
pub mod map_service;
pub mod replay;
pub mod settings;
pub mod tf;
pub mod timers;
pub mod transport;
pub mod view;
pub mod widgets;

// This prelude is for convenience for the binary and the tests.
pub mod prelude;
