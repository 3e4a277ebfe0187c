pub mod aggregate;
pub mod buckets;
pub mod cards;
pub mod cli;
pub mod config;
pub mod curves;
pub mod display;
pub mod error;
pub mod hand_strength;
pub mod history;
pub mod pipeline;
pub mod position;
pub mod scenario;
pub mod texture;
pub mod walker;
