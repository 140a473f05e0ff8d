#![forbid(unsafe_code)]

//! Core value types for mapsync.
//!
//! This crate holds everything that carries no binding state:
//!
//! - [`geometry`]: the model's plain-data geometry ([`Position`], [`Bounds`],
//!   [`Size`]).
//! - [`value`]: dynamic values exchanged with bindings ([`Value`]) and written
//!   into construction options ([`OptionValue`]).
//! - [`options`]: the insertion-ordered [`Options`] record handed to the
//!   mapping API constructors.
//! - [`api`]: the seam to the externally-owned mapping API (object traits,
//!   native geometry, event registration).
//! - [`transform`]: pure conversions between model geometry and the native
//!   geometry of the mapping API.

pub mod api;
pub mod geometry;
pub mod options;
pub mod transform;
pub mod value;

pub use geometry::{Bounds, Position, Size};
pub use options::Options;
pub use value::{OptionValue, Value};
