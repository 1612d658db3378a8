//! The five bounding planes of the court.

use serde::{Deserialize, Serialize};

use super::penalty::{PenaltyContact, Plane};
use crate::types::Vec3;

/// Court geometry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    /// Walls sit at x = ±half_extent and z = ±half_extent
    pub half_extent: f64,
    /// Centre of the hoop ring, used for scoring and as the net rim
    pub hoop_center: Vec3,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            half_extent: 10.0,
            hoop_center: Vec3::new(0.0, 6.5, -8.8),
        }
    }
}

/// Which bounding plane of the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Ground,
    FrontWall,
    LeftWall,
    RightWall,
    BackWall,
}

impl Boundary {
    pub const ALL: [Boundary; 5] = [
        Boundary::Ground,
        Boundary::FrontWall,
        Boundary::LeftWall,
        Boundary::RightWall,
        Boundary::BackWall,
    ];
}

/// Ground plane plus four walls, all normals pointing into the court.
#[derive(Debug, Clone, PartialEq)]
pub struct Court {
    planes: [Plane; 5],
    pub hoop_center: Vec3,
}

impl Default for Court {
    fn default() -> Self {
        Self::from_config(&CourtConfig::default())
    }
}

impl Court {
    pub fn from_config(config: &CourtConfig) -> Self {
        let e = config.half_extent;
        Self {
            planes: [
                Plane::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)),
                Plane::new(Vec3::new(0.0, 0.0, -e), Vec3::new(0.0, 0.0, 1.0)),
                Plane::new(Vec3::new(-e, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
                Plane::new(Vec3::new(e, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)),
                Plane::new(Vec3::new(0.0, 0.0, e), Vec3::new(0.0, 0.0, -1.0)),
            ],
            hoop_center: config.hoop_center,
        }
    }

    pub fn plane(&self, boundary: Boundary) -> &Plane {
        let index = match boundary {
            Boundary::Ground => 0,
            Boundary::FrontWall => 1,
            Boundary::LeftWall => 2,
            Boundary::RightWall => 3,
            Boundary::BackWall => 4,
        };
        &self.planes[index]
    }

    /// All five planes, ground first.
    pub fn planes(&self) -> &[Plane; 5] {
        &self.planes
    }

    /// First plane whose penalty test fires for a body at `pos` with `vel`.
    pub fn first_contact(&self, contact: &PenaltyContact, pos: Vec3, vel: Vec3) -> Option<Boundary> {
        Boundary::ALL
            .into_iter()
            .find(|b| contact.is_touching(self.plane(*b), pos, vel))
    }
}
