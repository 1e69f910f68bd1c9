//! Cross-component tests for the answer pipeline.
