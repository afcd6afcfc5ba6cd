//! Invoice ledger service.
//!
//! The pure invoice rules live in [`ledger`]; [`store`] persists invoices
//! (PostgreSQL or in-memory) and [`api`] exposes them over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;
