//! Rig Engine - 程序化生物的骨骼姿态与 IK 运行时
//!
//! 提供：
//! - 骨骼层次结构与姿态更新
//! - 旋转约束（逐轴 锁定/限制/自由）
//! - 两骨骼解析 IK、FABRIK、CCD（含约束版本）
//! - 次级运动：Verlet 毛发、漫游转向、地形贴合
//! - 生物实体（蛇、蜘蛛、章鱼）与测试骨架
//! - 顶点几何输出（渲染后端在外部）

pub mod animation;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod ik;
pub mod motion;
pub mod random;
pub mod rigs;
pub mod skeleton;
pub mod terrain;

pub use config::{get_config, reset_config, set_config, RigConfig};
pub use entity::{Creature, FrameContext};
pub use geometry::{Rgba8, Vertex};
pub use animation::{AnimClip, AnimStateMachine, RestPose};
pub use ik::{solve_fabrik, solve_two_bone, CcdOutcome, CcdReport, CcdSolver, FabrikChain, FabrikOutcome};
pub use motion::{HairSystem, Roam};
pub use random::RandomSource;
pub use rigs::{Biped, RoboticArm, TestChain};
pub use skeleton::{AxisConstraint, Bone, BoneFlags, RotationConstraint, Skeleton};
pub use terrain::{HeightField, TerrainQuery};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigError {
    #[error("Bone not found: {0}")]
    BoneNotFound(String),

    #[error("Bone '{bone}' references parent {parent} which is not in the skeleton yet")]
    InvalidParent { bone: String, parent: i32 },

    #[error("IK chain needs at least 2 joints, got {0}")]
    ChainTooShort(usize),

    #[error("Animation state not found: {0}")]
    UnknownState(String),
}

pub type Result<T> = std::result::Result<T, RigError>;
