pub mod handler;
pub mod keypad;
pub mod models;
pub mod repository;
pub mod service;
pub mod state;
pub mod summary;

#[cfg(test)]
mod testing;
