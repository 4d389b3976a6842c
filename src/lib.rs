pub mod analytics;
pub mod authentication;
pub mod budgets;
pub mod categories;
pub mod cli;
pub mod client;
mod client_ip;
mod cors;
mod database;
pub mod email;
pub mod envelope;
pub mod expenses;
pub mod http_err;
pub mod identities;
mod models;
pub mod passwords;
pub mod rate_limit;
pub mod reports;
pub mod repos;
pub mod server;
