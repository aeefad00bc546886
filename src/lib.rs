pub mod accounts;
pub mod api;
pub mod appointment;
pub mod config;
pub mod crypto;
pub mod db;
pub mod models;
pub mod reporting;
pub mod text;
