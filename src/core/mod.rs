//! Core module - Contains the data model and the leaf utilities
//!
//! This module provides:
//! - Medicine record and grouped result model
//! - Error type
//! - Encoding and delimiter sniffing
//! - Text normalization
//! - Row to record mapping
//! - Rendering functions for different output formats

pub mod error;
pub mod model;
pub mod normalize;
pub mod record;
pub mod render;
pub mod sniff;
