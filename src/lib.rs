//! The backend for Campus Pickup, where students find and join pickup games
//! at their school.
//!
//! [routes] lays out the REST API. Handlers validate requests through the
//! forms in [models], apply them through the [db::Database] trait, and send
//! notifications with [email].

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod util;

#[cfg(test)]
mod tests;
