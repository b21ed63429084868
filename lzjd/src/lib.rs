//! Lempel-Ziv Jaccard Distance (LZJD) of byte streams.
//!
//! An input is parsed into its Lempel-Ziv phrases on the fly, each novel phrase is
//! represented by its MurmurHash3, and the `k` smallest hashes form a min-hash sketch.
//! Two sketches are compared by the Jaccard similarity of their hash sets.
//!
//! # Examples
//!
//! ```
//! use lzjd::{Hasher, HasherConfig};
//!
//! let hasher = Hasher::new(HasherConfig::default()).unwrap();
//! let mut scratch = hasher.scratch();
//!
//! let a = hasher.digest_bytes(&mut scratch, b"the quick brown fox jumps over the lazy dog");
//! let b = hasher.digest_bytes(&mut scratch, b"the quick brown fox jumps over the lazy cat");
//! let sim = lzjd::similarity(&a, &b);
//! assert!(0. < sim && sim < 1.);
//! assert_eq!(lzjd::distance(&a, &b), 1. - sim);
//! ```
#![deny(missing_docs)]

pub mod batch;
pub mod cache;
pub mod codec;
pub mod config;
pub mod errors;
pub mod hasher;
pub mod int_set;
pub mod lz;
pub mod murmur;
pub mod output;
pub mod sketch;

pub use batch::BatchEngine;
pub use codec::DigestRecord;
pub use config::{BatchConfig, HasherConfig};
pub use errors::{LzjdError, Result};
pub use hasher::Hasher;
pub use sketch::{distance, similarity, Sketch};
