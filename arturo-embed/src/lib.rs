// arturo-embed - High-level embedding API for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! # arturo-embed
//!
//! Embed Arturo in a Rust application: one `Engine`, `eval` strings, move
//! values across the boundary.

pub mod convert;
pub mod engine;

pub use convert::{FromArturoVal, IntoArturoVal};
pub use engine::Engine;
