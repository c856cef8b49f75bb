//! Local-first personal productivity data: time tracking, goals, calendar, journal and
//! monthly reviews over a flat key/value store.

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod dates;
pub mod error;
pub mod journal;
pub mod markdown;
pub mod mirror;
pub mod models;
pub mod planner;
pub mod pomodoro;
pub mod repository;
pub mod review;
pub mod store;
pub mod tracker;
pub mod workspace;

#[cfg(test)]
mod test_utils;
