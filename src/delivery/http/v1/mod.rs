pub mod follows;
pub mod likes;
pub mod middleware;
pub mod notifications;
pub mod profile;
pub mod ws;
