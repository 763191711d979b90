//! 骨骼系统
//!
//! 核心设计思想：
//! - Bone: 骨骼层次中的单个节点，持有相对父骨骼的本地变换
//! - Skeleton: 按拓扑顺序存放的骨骼数组 + 模型变换
//! - RotationConstraint: 提交本地旋转前的逐轴限制

mod bone;
mod constraint;
mod hierarchy;

pub use bone::{Bone, BoneFlags};
pub use constraint::{AxisConstraint, RotationConstraint};
pub use hierarchy::Skeleton;

use glam::{Mat4, Quat, Vec3};

// ============================================================================
// 公共工具
// ============================================================================

/// 从仿射矩阵中取出旋转（忽略平移）
#[inline]
pub(crate) fn rotation_of(m: &Mat4) -> Quat {
    Quat::from_mat4(m).normalize()
}

/// 从仿射矩阵中取出平移
#[inline]
pub(crate) fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}
