pub mod analytics;
pub mod health;
pub mod import;
pub mod notification;
pub mod records;
pub mod view;
