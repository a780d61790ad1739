pub mod camera;
pub mod config;
pub mod error;
pub mod exercise;
pub mod pose;
pub mod record;
pub mod render;
pub mod session;
pub mod speech;
