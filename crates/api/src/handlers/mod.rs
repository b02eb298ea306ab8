pub mod approval;
pub mod auth;
pub mod import;
pub mod profile;
pub mod story;
pub mod submission;
