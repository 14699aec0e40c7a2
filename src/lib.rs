//! Client-side aggregator for the NASA image search API.
//!
//! [`services::SearchAggregator`] issues paginated searches through a
//! [`clients::Transport`], decodes them into [`domain`] records, keeps a
//! deduplicated page-ordered set for the current query and reports changes
//! to a single [`observer::SearchObserver`].

pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod observer;
pub mod repo;
pub mod routes;
pub mod services;
pub mod utils;
