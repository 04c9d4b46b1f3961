pub mod config;
pub mod database;
pub mod models;
pub mod otp;
pub mod services;
pub mod session;
pub mod state;
pub mod web;
