//! Adapters implementing the domain ports.

pub mod food_facts;
pub mod memory;
pub mod notifications;
pub mod persistence;
