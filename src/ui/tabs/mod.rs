pub mod notifications;
pub mod profile;
pub mod reports;
