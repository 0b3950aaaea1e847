//! API endpoint handlers.
//!
//! Handlers are thin: parse ids, open a connection, call into the
//! coordinator/billing/views modules, map errors by kind.

pub mod admissions;
pub mod health;
pub mod invoices;
pub mod notifications;
pub mod views;
