//! Waybill Locator — resolves the delivery city of a free-form shipping
//! address against a cached city gazetteer.

pub mod address;
pub mod config;
pub mod gazetteer;
pub mod server;
