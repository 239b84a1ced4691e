pub mod compute;
pub mod config;
pub mod display;
pub mod entities;
pub mod error;
pub mod input;
pub mod level;
pub mod score;
pub mod session;
pub mod states;
