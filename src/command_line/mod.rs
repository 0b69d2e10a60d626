#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
mod cli;

pub use cli::run;
