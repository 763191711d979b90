//! CCD 求解器（循环坐标下降）
//!
//! 从倒数第二个关节往根逐个旋转，让 关节→末端 对准 关节→目标。
//! 支持：
//! - 逐轴约束：候选本地旋转提交前经过骨骼的 RotationConstraint
//! - 死区：约束模式下目标离链根太近时不求解
//! - 虚拟末端：末端是两个真实骨骼位置的中点（夹爪），每次旋转后重算

use glam::{Quat, Vec3};

use super::{chain_length, direction, rotation_axis};
use crate::skeleton::Skeleton;

/// 对齐判定（点积）
const ALIGNED_DOT: f32 = 0.9999;
/// 伸直判定余量
const EXTENDED_SLACK: f32 = 1e-4;
/// 小于此角度（弧度）的修正跳过
const MIN_ANGLE: f32 = 0.001;

/// CCD 结束原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcdOutcome {
    /// 末端进入收敛阈值
    Converged,
    /// 用完迭代次数
    Exhausted,
    /// 末端已对准且链已伸直，提前结束
    Aligned,
    /// 目标超出链长，逐关节伸直指向目标
    Unreachable,
    /// 约束模式下目标落在死区内，未求解
    DeadZone,
    /// 链少于两个关节
    Skipped,
}

/// 一次求解的统计
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CcdReport {
    pub outcome: CcdOutcome,
    /// 执行的完整迭代次数
    pub iterations: u32,
    /// 实际提交的关节旋转次数
    pub rotations: u32,
    /// 结束时末端到目标的距离
    pub distance: f32,
}

/// CCD 求解器
#[derive(Clone, Debug)]
pub struct CcdSolver {
    /// 根到末端的关节索引
    pub chain: Vec<usize>,
    /// 末端骨骼（可以不是链的最后一项）
    pub effector: usize,
    /// 虚拟末端：取两骨骼世界位置的中点写入 effector
    pub midpoint: Option<(usize, usize)>,
    pub max_iterations: u32,
    pub threshold: f32,
    /// 是否应用骨骼约束
    pub constrained: bool,
    /// 约束模式下的死区半径
    pub dead_zone: f32,
}

impl CcdSolver {
    /// 默认 10 次迭代、0.01 阈值、无约束
    pub fn new(chain: Vec<usize>, effector: usize) -> Self {
        Self {
            chain,
            effector,
            midpoint: None,
            max_iterations: 10,
            threshold: 0.01,
            constrained: false,
            dead_zone: 0.0,
        }
    }

    pub fn with_midpoint(mut self, a: usize, b: usize) -> Self {
        self.midpoint = Some((a, b));
        self
    }

    pub fn with_iterations(mut self, max_iterations: u32, threshold: f32) -> Self {
        self.max_iterations = max_iterations;
        self.threshold = threshold;
        self
    }

    /// 启用约束与死区
    pub fn with_constraints(mut self, dead_zone: f32) -> Self {
        self.constrained = true;
        self.dead_zone = dead_zone;
        self
    }

    /// 求解；要求姿态已是最新，返回时姿态与虚拟末端都已刷新
    pub fn solve(&self, skeleton: &mut Skeleton, target: Vec3) -> CcdReport {
        if self.chain.len() < 2 {
            return self.report(skeleton, target, CcdOutcome::Skipped, 0, 0);
        }

        let root = skeleton.world_position(self.chain[0]);
        if self.constrained && root.distance(target) < self.dead_zone {
            return self.report(skeleton, target, CcdOutcome::DeadZone, 0, 0);
        }

        self.refresh_effector(skeleton);
        let total = chain_length(skeleton, &self.chain);

        if root.distance(target) > total {
            let rotations = self.straighten_toward(skeleton, root, target);
            return self.report(skeleton, target, CcdOutcome::Unreachable, 0, rotations);
        }

        let mut rotations = 0;
        for iteration in 0..self.max_iterations {
            for i in (0..self.chain.len() - 1).rev() {
                let joint = self.chain[i];
                let joint_pos = skeleton.world_position(joint);
                let effector_pos = skeleton.world_position(self.effector);

                let (Some(to_effector), Some(to_target)) =
                    (direction(effector_pos - joint_pos), direction(target - joint_pos))
                else {
                    continue;
                };

                let dot = to_effector.dot(to_target).clamp(-1.0, 1.0);
                if dot > ALIGNED_DOT && root.distance(effector_pos) > total - EXTENDED_SLACK {
                    return self.report(skeleton, target, CcdOutcome::Aligned, iteration + 1, rotations);
                }

                let angle = dot.acos();
                if angle < MIN_ANGLE {
                    continue;
                }

                let axis = match rotation_axis(to_effector, to_target) {
                    Some(axis) => axis,
                    // 反向共线
                    None => to_effector.any_orthonormal_vector(),
                };

                self.rotate_joint(skeleton, joint, Quat::from_axis_angle(axis, angle));
                rotations += 1;
            }

            if skeleton.world_position(self.effector).distance(target) < self.threshold {
                return self.report(skeleton, target, CcdOutcome::Converged, iteration + 1, rotations);
            }
        }

        self.report(skeleton, target, CcdOutcome::Exhausted, self.max_iterations, rotations)
    }

    /// 不可达：逐关节把出段转向 根→目标 方向
    fn straighten_toward(&self, skeleton: &mut Skeleton, root: Vec3, target: Vec3) -> u32 {
        let Some(toward) = direction(target - root) else {
            return 0;
        };

        let mut rotations = 0;
        for i in 0..self.chain.len() - 1 {
            let joint = self.chain[i];
            let segment = skeleton.world_position(self.chain[i + 1]) - skeleton.world_position(joint);
            let Some(segment) = direction(segment) else {
                continue;
            };
            self.rotate_joint(skeleton, joint, Quat::from_rotation_arc(segment, toward));
            rotations += 1;
        }
        rotations
    }

    /// 世界空间增量旋转换到父空间后左乘到本地旋转，再刷新姿态与虚拟末端
    fn rotate_joint(&self, skeleton: &mut Skeleton, joint: usize, delta: Quat) {
        let parent = skeleton.parent_world_rotation(joint);
        let local_delta = parent.inverse() * delta * parent;
        let candidate = local_delta * skeleton.bone(joint).local_rotation;

        let bone = skeleton.bone_mut(joint);
        if self.constrained {
            bone.set_constrained_rotation(candidate);
        } else {
            bone.set_local_rotation(candidate);
        }

        skeleton.update_pose();
        self.refresh_effector(skeleton);
    }

    fn refresh_effector(&self, skeleton: &mut Skeleton) {
        if let Some((a, b)) = self.midpoint {
            let mid = (skeleton.world_position(a) + skeleton.world_position(b)) * 0.5;
            skeleton.pin_world_position(self.effector, mid);
        }
    }

    fn report(
        &self,
        skeleton: &Skeleton,
        target: Vec3,
        outcome: CcdOutcome,
        iterations: u32,
        rotations: u32,
    ) -> CcdReport {
        let distance = skeleton.world_position(self.effector).distance(target);
        log::trace!(
            "CCD {:?}: {} iterations, {} rotations, distance {:.4}",
            outcome,
            iterations,
            rotations,
            distance
        );
        CcdReport {
            outcome,
            iterations,
            rotations,
            distance,
        }
    }
}
