//! Gendex - a Pokemon-by-generation browser for the terminal.
//!
//! This library exposes the app's modules for testing.

pub mod action;
pub mod api;
pub mod audio;
pub mod effect;
pub mod reducer;
pub mod sprite;
pub mod state;
pub mod ui;
