//! End-to-end conversation scenarios over the built-in tenants

pub mod lead_generation_test;
