//! IK 求解器
//!
//! - two_bone: 两骨解析解（余弦定理）
//! - fabrik:   前后向到达，只求位置，再换算回本地旋转
//! - ccd:      循环坐标下降，可选逐轴约束与死区
//!
//! 所有求解器都不返回错误：不可达目标退化为伸直姿态，
//! 零长度方向跳过对应关节，保证不产生 NaN。
//! IK 链是按根到末端排列的骨骼索引，每次调用现构造，不做越界检查。

mod ccd;
mod fabrik;
mod two_bone;

pub use ccd::{CcdOutcome, CcdReport, CcdSolver};
pub use fabrik::{reach_positions, solve_fabrik, FabrikChain, FabrikOutcome};
pub use two_bone::solve_two_bone;

use glam::Vec3;

use crate::skeleton::Skeleton;

/// 方向向量长度平方低于此值视为退化
pub(crate) const DIRECTION_EPSILON: f32 = 1e-5;

/// 叉积长度平方低于此值视为共线
const AXIS_EPSILON: f32 = 1e-12;

/// 单位化；过短返回 None
#[inline]
pub(crate) fn direction(v: Vec3) -> Option<Vec3> {
    if v.length_squared() < DIRECTION_EPSILON {
        None
    } else {
        Some(v.normalize())
    }
}

/// 两向量张成平面的法线；共线时返回 None
///
/// 比 `direction` 宽松得多，小角度修正的叉积也能用。
#[inline]
pub(crate) fn rotation_axis(from: Vec3, to: Vec3) -> Option<Vec3> {
    let axis = from.cross(to);
    if axis.length_squared() < AXIS_EPSILON {
        None
    } else {
        Some(axis.normalize())
    }
}

/// 链上相邻关节世界距离之和
pub fn chain_length(skeleton: &Skeleton, chain: &[usize]) -> f32 {
    chain
        .windows(2)
        .map(|pair| skeleton.world_position(pair[0]).distance(skeleton.world_position(pair[1])))
        .sum()
}

/// 链上各关节当前世界位置
pub fn chain_positions(skeleton: &Skeleton, chain: &[usize]) -> Vec<Vec3> {
    chain.iter().map(|&i| skeleton.world_position(i)).collect()
}
