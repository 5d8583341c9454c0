// src/models/mod.rs
pub mod credential;
pub mod employee;
pub mod sheet;
