//! FABRIK 求解器
//!
//! 只在位置空间工作：先后向（末端→根）再前向（根→末端）各走一遍，
//! 保持每段长度；然后把相邻关节位置换算回骨骼的本地旋转。
//! 每次调用只走一遍，调用方逐帧重复调用以逼近移动中的目标。

use glam::{Quat, Vec3};

use super::{chain_positions, direction};
use crate::skeleton::Skeleton;
use crate::{Result, RigError};

/// FABRIK 求解结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FabrikOutcome {
    /// 目标在可达范围内，完成一次后向 + 前向
    Reached,
    /// 目标不可达，整条链沿根→目标方向伸直
    Extended,
    /// 链少于两个关节，未做任何事
    Skipped,
}

// ============================================================================
// 位置求解
// ============================================================================

/// 在给定关节位置上做一次 FABRIK，`lengths[i]` 是 i → i+1 段的长度
///
/// 根关节位置不变。退化段沿求解前的方向摆放。
pub fn reach_positions(positions: &mut [Vec3], lengths: &[f32], target: Vec3) -> FabrikOutcome {
    let count = positions.len();
    if count < 2 || lengths.len() < count - 1 {
        return FabrikOutcome::Skipped;
    }

    let root = positions[0];
    let total: f32 = lengths[..count - 1].iter().sum();

    // 求解前的段方向，用作退化段的备用方向
    let rest: Vec<Vec3> = positions
        .windows(2)
        .map(|pair| direction(pair[1] - pair[0]).unwrap_or(Vec3::Z))
        .collect();

    if root.distance(target) > total {
        let toward = direction(target - root).unwrap_or(rest[0]);
        for i in 0..count - 1 {
            positions[i + 1] = positions[i] + toward * lengths[i];
        }
        return FabrikOutcome::Extended;
    }

    // 后向：末端贴到目标
    positions[count - 1] = target;
    for i in (0..count - 1).rev() {
        let toward = direction(positions[i] - positions[i + 1]).unwrap_or(-rest[i]);
        positions[i] = positions[i + 1] + toward * lengths[i];
    }

    // 前向：根回到原位
    positions[0] = root;
    for i in 0..count - 1 {
        let toward = direction(positions[i + 1] - positions[i]).unwrap_or(rest[i]);
        positions[i + 1] = positions[i] + toward * lengths[i];
    }

    FabrikOutcome::Reached
}

/// 把求得的关节位置写回骨骼旋转
///
/// 逐段计算当前方向到目标方向的最小旋转，按父骨骼当前世界旋转换算到本地，
/// 每段写入后立刻刷新该关节子树，下一段读到的就是最新世界变换。
fn apply_positions(skeleton: &mut Skeleton, chain: &[usize], positions: &[Vec3]) {
    for i in 0..chain.len() - 1 {
        let joint = chain[i];
        let current = skeleton.world_position(chain[i + 1]) - skeleton.world_position(joint);
        let desired = positions[i + 1] - positions[i];

        let (Some(from), Some(to)) = (direction(current), direction(desired)) else {
            continue;
        };

        skeleton.rotate_bone_in_world(joint, Quat::from_rotation_arc(from, to));
        skeleton.update_subtree(joint);
    }
}

// ============================================================================
// 带长度缓存的链
// ============================================================================

/// 缓存了段长度的 FABRIK 链（蜘蛛腿等长期存在的链）
#[derive(Clone, Debug)]
pub struct FabrikChain {
    /// 根到末端的骨骼索引
    pub joints: Vec<usize>,
    /// 各段静止长度
    pub lengths: Vec<f32>,
}

impl FabrikChain {
    /// 以当前世界姿态下的关节距离作为静止长度
    pub fn new(skeleton: &Skeleton, joints: Vec<usize>) -> Result<Self> {
        if joints.len() < 2 {
            return Err(RigError::ChainTooShort(joints.len()));
        }
        let lengths = joints
            .windows(2)
            .map(|pair| skeleton.world_position(pair[0]).distance(skeleton.world_position(pair[1])))
            .collect();
        Ok(Self { joints, lengths })
    }

    #[inline]
    pub fn total_length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// 末端关节
    #[inline]
    pub fn end(&self) -> usize {
        self.joints[self.joints.len() - 1]
    }

    /// 一次 FABRIK 并写回骨骼；要求姿态已是最新
    pub fn solve(&self, skeleton: &mut Skeleton, target: Vec3) -> FabrikOutcome {
        let mut positions = chain_positions(skeleton, &self.joints);
        let outcome = reach_positions(&mut positions, &self.lengths, target);
        if outcome != FabrikOutcome::Skipped {
            apply_positions(skeleton, &self.joints, &positions);
        }
        log::trace!("FABRIK {:?} -> {:?}", self.joints, outcome);
        outcome
    }
}

/// 通用入口：段长度取当前世界距离，每次调用现算
pub fn solve_fabrik(skeleton: &mut Skeleton, chain: &[usize], target: Vec3) -> FabrikOutcome {
    match FabrikChain::new(skeleton, chain.to_vec()) {
        Ok(chain) => chain.solve(skeleton, target),
        Err(_) => FabrikOutcome::Skipped,
    }
}
