//! C-News - a server-rendered news portal
//!
//! This library renders the pages of the portal from the remote content API:
//! articles, categories, tags, comments and user accounts.

pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod theme;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;
