// src/lib.rs

//! Security reconnaissance API: certificate-transparency subdomain enumeration with DNS
//! verification, confidence scoring and a time-boxed result cache.

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod logging;
