pub mod auth;
pub mod guard;
pub mod transactions;
pub mod users;
