//! Nutriscore API Library
//!
//! Personalized product health scoring: a barcode is resolved to a product
//! record, the record and a user health profile are turned into a fixed-order
//! feature vector, and a pre-trained random-forest regressor scores it.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Scoring pipeline (extraction, features, prediction).
//! - `integrations`: External service integrations.
//! - `circuit_breaker`: Circuit breaker for the product source.
//! - `coercion`: Loose number/truthiness reading of untrusted JSON.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `features`: Feature composition.
//! - `forest`: Random-forest model file format and evaluation.
//! - `handlers`: HTTP request handlers.
//! - `labeling`: Offline training-label formula.
//! - `models`: Core data models.
//! - `nutrition`: Product record extraction.
//! - `predictor`: Score predictor over a fitted regressor.
//! - `product_client`: Open Food Facts lookup client.
//! - `scoring`: End-to-end pipeline.

pub mod api;
pub mod core;
pub mod integrations;

pub mod circuit_breaker;
pub mod coercion;
pub mod config;
pub mod errors;
pub mod features;
pub mod forest;
pub mod handlers;
pub mod labeling;
pub mod models;
pub mod nutrition;
pub mod predictor;
pub mod product_client;
pub mod scoring;
