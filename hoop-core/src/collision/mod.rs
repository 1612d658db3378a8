//! Penalty-based contact between point bodies and the court's planes.
//!
//! This module handles:
//! - **Court**: The five bounding planes (ground plus four walls)
//! - **Penalty**: Spring-damper contact force against one infinite plane
//!
//! ## Penalty Contact
//!
//! Rather than solving a hard non-penetration constraint, a body near a plane
//! receives a corrective force proportional to how far it sits on the wrong
//! side, minus a damping term along the normal:
//!
//! ```text
//!            n
//!            ↑
//! ═══════════╪═══════════  plane (point p)
//!            ●             body at x, velocity v
//!
//! f = ks * n * ((p - x)·n) - kd * n * (v·n)
//! ```
//!
//! The force is only applied while `f·n > 0`. Planes are tested
//! independently, so at edges and corners several penalties stack.

pub mod court;
pub mod penalty;

pub use court::*;
pub use penalty::*;
