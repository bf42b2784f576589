//! Lead Enrichment & Scoring API Library
//!
//! This library maintains sales leads, enriches each lead's company from
//! several independent third-party sources, fuses their partial answers into
//! one confidence-rated profile and scores the lead for outreach priority.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Enrichment pipeline and scoring.
//! - `integrations`: Third-party source adapters.
//! - `batch`: Windowed, paced enrichment over many leads.
//! - `cache_validator`: Integrity-checked cache entries.
//! - `circuit_breaker`: Per-source circuit breakers.
//! - `config`: Configuration management.
//! - `coordinator`: Concurrent fan-out over source adapters.
//! - `enrichment`: Lead enrichment pipeline.
//! - `errors`: Error handling types.
//! - `fusion`: Merging source results into an enriched profile.
//! - `handlers`: HTTP request handlers.
//! - `lead_store`: Lead storage.
//! - `models`: Core data models.
//! - `prospecting`: Lead generation.
//! - `routes`: Router assembly.
//! - `scoring`: Lead scoring.
//! - `sources`: Source adapter implementations.

pub mod api;
pub mod core;
pub mod integrations;

pub mod batch;
pub mod cache_validator;
pub mod circuit_breaker;
pub mod config;
pub mod coordinator;
pub mod enrichment;
pub mod errors;
pub mod fusion;
pub mod handlers;
pub mod lead_store;
pub mod models;
pub mod prospecting;
pub mod routes;
pub mod scoring;
pub mod sources;
