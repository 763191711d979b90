//! 机械臂
//!
//! 4 节带约束的臂骨 + 两根两节夹爪 + 不渲染的夹爪中点。
//! 每帧以中点为虚拟末端跑一次 CCD，链为 [底座, 下臂, 上臂, 腕, 中点]。

use glam::Vec3;

use crate::config::RigConfig;
use crate::geometry::{add_verts_for_cylinder, add_verts_for_sphere, Rgba8, Vertex, DEFAULT_STACKS};
use crate::ik::{CcdReport, CcdSolver};
use crate::skeleton::{AxisConstraint, Bone, RotationConstraint, Skeleton};
use crate::Result;

/// 夹爪中点（虚拟末端）
pub const CLAW_MIDPOINT: usize = 8;
/// CCD 链
pub const ARM_CHAIN: [usize; 5] = [0, 1, 2, 3, CLAW_MIDPOINT];
/// 两个夹爪尖
pub const CLAW_TIPS: (usize, usize) = (5, 7);

/// 初始目标
pub const DEFAULT_TARGET: Vec3 = Vec3::new(0.0, 0.0, 7.0);

const ARM_JOINT_RADIUS: f32 = 0.235;
const CLAW_JOINT_RADIUS: f32 = 0.1;
const ARM_SLICES: u32 = 32;

/// 机械臂测试骨架
#[derive(Clone, Debug)]
pub struct RoboticArm {
    pub skeleton: Skeleton,
    solver: CcdSolver,
    target: Vec3,
    debug_log: bool,
}

impl RoboticArm {
    pub fn new(config: &RigConfig) -> Result<Self> {
        let mut skeleton = Self::build_skeleton()?;
        let (a, b) = CLAW_TIPS;
        let midpoint = (skeleton.world_position(a) + skeleton.world_position(b)) * 0.5;
        skeleton.pin_world_position(CLAW_MIDPOINT, midpoint);

        let solver = CcdSolver::new(ARM_CHAIN.to_vec(), CLAW_MIDPOINT)
            .with_midpoint(a, b)
            .with_iterations(config.ik_max_iterations, config.ik_threshold)
            .with_constraints(config.ccd_dead_zone);

        log::info!("机械臂已创建: {} 根骨骼", skeleton.len());
        Ok(Self {
            skeleton,
            solver,
            target: DEFAULT_TARGET,
            debug_log: config.debug_log,
        })
    }

    fn build_skeleton() -> Result<Skeleton> {
        let limited = AxisConstraint::limited;
        let locked = AxisConstraint::Locked;

        Skeleton::from_bones([
            Bone::new("RootRotator").with_constraint(RotationConstraint::new(
                limited(-45.0, 45.0),
                limited(-45.0, 45.0),
                locked,
            )),
            Bone::child_of("LowerExtender", 0, Vec3::new(0.0, 0.0, 3.0)).with_constraint(RotationConstraint::new(
                limited(-90.0, 90.0),
                limited(0.0, 0.0),
                locked,
            )),
            Bone::child_of("UpperExtender", 1, Vec3::new(0.0, 0.0, 2.0))
                .with_constraint(RotationConstraint::new(limited(-135.0, 135.0), locked, locked)),
            Bone::child_of("Wrist", 2, Vec3::Z).with_constraint(RotationConstraint::new(
                limited(-30.0, 30.0),
                limited(-45.0, 45.0),
                locked,
            )),
            Bone::child_of("ClawBase1", 3, Vec3::new(0.0, 0.5, 0.5)),
            Bone::child_of("ClawTip1", 4, Vec3::new(0.0, -0.25, 0.5)),
            Bone::child_of("ClawBase2", 3, Vec3::new(0.0, -0.5, 0.5)),
            Bone::child_of("ClawTip2", 6, Vec3::new(0.0, 0.25, 0.5)),
            {
                let mut midpoint = Bone::new("ClawMidpoint");
                midpoint.set_renderable(false);
                midpoint
            },
        ])
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// 目标不能低于地面
    pub fn set_target(&mut self, target: Vec3) {
        self.target = Vec3::new(target.x, target.y, target.z.max(0.0));
    }

    pub fn move_target(&mut self, delta: Vec3) {
        self.set_target(self.target + delta);
    }

    #[inline]
    pub fn is_constrained(&self) -> bool {
        self.solver.constrained
    }

    pub fn set_constrained(&mut self, constrained: bool) {
        self.solver.constrained = constrained;
    }

    /// 切换约束模式，返回切换后的状态
    pub fn toggle_constraints(&mut self) -> bool {
        self.solver.constrained = !self.solver.constrained;
        log::info!("机械臂约束: {}", if self.solver.constrained { "开" } else { "关" });
        self.solver.constrained
    }

    /// 夹爪中点当前的世界位置
    #[inline]
    pub fn effector_position(&self) -> Vec3 {
        self.skeleton.world_position(CLAW_MIDPOINT)
    }

    /// 朝当前目标求解一次
    pub fn update(&mut self) -> CcdReport {
        let report = self.solver.solve(&mut self.skeleton, self.target);
        if self.debug_log {
            log::debug!(
                "机械臂 CCD ({}): {:?}, 迭代 {}, 距离 {:.4}",
                if self.solver.constrained { "约束" } else { "自由" },
                report.outcome,
                report.iterations,
                report.distance
            );
        }
        report
    }

    /// 臂骨用粗关节，夹爪用细关节；中点不输出
    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        for (index, bone) in self.skeleton.bones().iter().enumerate() {
            if !bone.is_renderable() {
                continue;
            }
            let radius = if index >= 4 { CLAW_JOINT_RADIUS } else { ARM_JOINT_RADIUS };
            let position = self.skeleton.world_position(index);
            add_verts_for_sphere(verts, position, radius, Rgba8::BLACK, ARM_SLICES, DEFAULT_STACKS);

            if let Some(parent) = bone.parent_id() {
                let start = self.skeleton.world_position(parent);
                add_verts_for_cylinder(verts, start, position, radius, Rgba8::rgb(128, 128, 128), ARM_SLICES);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik::CcdOutcome;

    fn arm() -> RoboticArm {
        RoboticArm::new(&RigConfig::default()).unwrap()
    }

    fn assert_midpoint(arm: &RoboticArm) {
        let (a, b) = CLAW_TIPS;
        let expected = (arm.skeleton.world_position(a) + arm.skeleton.world_position(b)) * 0.5;
        assert!((arm.effector_position() - expected).length() < 1e-4);
    }

    #[test]
    fn test_rest_pose_reaches_default_target() {
        let mut arm = arm();
        assert!(arm.is_constrained());
        // 底座 3 + 2 + 1，夹爪中点再高 1
        assert!((arm.effector_position() - DEFAULT_TARGET).length() < 1e-5);

        let report = arm.update();
        assert_eq!(report.outcome, CcdOutcome::Aligned);
        assert!(report.distance < 1e-4);
    }

    #[test]
    fn test_target_is_kept_above_ground() {
        let mut arm = arm();
        arm.set_target(Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(arm.target(), Vec3::new(1.0, 2.0, 0.0));
        arm.move_target(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(arm.target().z, 0.0);
    }

    #[test]
    fn test_dead_zone_when_constrained() {
        let mut arm = arm();
        arm.set_target(Vec3::new(0.5, 0.0, 1.0));
        let before = arm.effector_position();

        assert_eq!(arm.update().outcome, CcdOutcome::DeadZone);
        assert_eq!(arm.effector_position(), before);
    }

    #[test]
    fn test_unconstrained_solve_approaches_target() {
        let mut arm = arm();
        assert!(!arm.toggle_constraints());
        let target = Vec3::new(2.0, 0.0, 4.0);
        arm.set_target(target);
        let before = arm.effector_position().distance(target);

        let report = arm.update();
        assert!(report.distance < before);
        assert!(report.iterations <= 10);
        assert_midpoint(&arm);
    }

    #[test]
    fn test_constrained_solve_respects_limits() {
        let mut arm = arm();
        arm.set_target(Vec3::new(2.0, 1.0, 4.0));
        arm.update();

        for joint in 0..4 {
            let bone = arm.skeleton.bone(joint);
            let (yaw, pitch, roll) = RotationConstraint::to_euler_degrees(bone.local_rotation);
            let c = bone.constraint;
            assert!((c.yaw.clamp_degrees(yaw) - yaw).abs() < 0.1, "joint {joint} yaw {yaw}");
            assert!((c.pitch.clamp_degrees(pitch) - pitch).abs() < 0.1, "joint {joint} pitch {pitch}");
            assert!(roll.abs() < 0.1, "joint {joint} roll {roll}");
        }
        assert_midpoint(&arm);
    }

    #[test]
    fn test_midpoint_is_not_rendered() {
        let arm = arm();
        let mut verts = Vec::new();
        arm.emit_geometry(&mut verts);
        assert!(!verts.is_empty());
        assert!(!arm.skeleton.bone(CLAW_MIDPOINT).is_renderable());
    }
}
