// src/services/mod.rs
pub mod account_service;
pub mod auth_service;
pub mod column_detect;
pub mod credential_service;
pub mod employee_service;
pub mod password_policy;
pub mod spreadsheet;
