//! Flutter bridge entry for the review dashboard.

pub mod api;
