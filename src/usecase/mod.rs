pub mod connections;
pub mod contracts;
pub mod delivery;
pub mod error;
pub mod follows;
pub mod jwt;
pub mod likes;
pub mod notifications;
pub mod profile;
