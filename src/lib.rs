//! Bloom: a video discovery API.
//!
//! Free-text prompts become search queries, queries fan out to an external
//! video index, candidates are merged, enriched, scored and diversified,
//! all under a cache / rate-limit / degraded-mode contract. A deterministic
//! per-session rotation engine drives the daily queue. All state is
//! process memory.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod counters;
pub mod daily;
pub mod logging;
pub mod ratelimit;
pub mod rotation;
pub mod search;
pub mod state;
pub mod upstream;
pub mod util;
pub mod web;
