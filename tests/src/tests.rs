mod actions;
mod config;
mod refresh;
mod sync;
