//! 次级运动
//!
//! 叠加在已求解姿态之上的廉价程序化运动，与 IK 无关：
//! - hair: Verlet 毛发
//! - roam: 漫游转向 + 地形切线基

mod hair;
mod roam;

pub use hair::{HairParams, HairStrand, HairSystem};
pub use roam::{heading_from_degrees, slerp_direction, smoothstep3, terrain_basis, Roam};
