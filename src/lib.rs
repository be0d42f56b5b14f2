//! Portrait stylizer: hand a photo and a style to an image-generation
//! provider and get the stylized portrait back.

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod providers;
pub mod styles;
pub mod stylizer;
pub mod web;

pub use error::StylizerError;
pub use providers::Provider;
pub use stylizer::Stylizer;
