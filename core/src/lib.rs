pub mod achievement;
pub mod click;
pub mod clock;
pub mod config;
pub mod daily;
pub mod drop_game;
pub mod engine;
pub mod error;
pub mod event;
pub mod progress;
pub mod quiz;
pub mod rng;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;
pub mod upgrade;
pub mod wallet;
