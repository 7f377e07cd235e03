//! Bazaar: an edge gateway in front of a user service and a product service
//! that share one bearer-token contract.

pub mod app;
pub mod auth;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod gateway;
pub mod products;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod users;
