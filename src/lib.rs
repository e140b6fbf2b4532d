//! JANAPADA: registration service for the student writing competition.

pub mod app;
pub mod config;
pub mod email;
pub mod error;
pub mod i18n;
pub mod registration;
pub mod store;
