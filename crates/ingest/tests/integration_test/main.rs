/// Integration tests for the ingestion crate covering the full pipeline,
/// per-source failure handling, and index persistence.

mod helpers;
mod index;
mod pipeline;
