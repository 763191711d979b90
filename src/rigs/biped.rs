//! 两骨 IK 测试人形
//!
//! 髋、双腿、躯干、肩、手臂、手。左右手臂各是一条 肩 → 上臂 → 手 的两骨链，
//! 同一时刻只有一条手臂追踪目标。

use glam::{Quat, Vec3};

use crate::config::RigConfig;
use crate::geometry::{add_verts_for_skeleton, SkeletonStyle, Vertex};
use crate::ik::solve_two_bone;
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

/// 初始目标（右臂够不到，手臂会伸直指向它）
pub const DEFAULT_TARGET: Vec3 = Vec3::new(-1.5, -2.0, 3.0);

/// 自由摆动时肩部的最大角度（度）
const SHOULDER_SWING_DEGREES: f32 = 2.0;

/// 追踪目标的手臂
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Arm {
    Left,
    #[default]
    Right,
}

impl Arm {
    /// (肩, 上臂, 手)
    pub const fn chain(self) -> (usize, usize, usize) {
        match self {
            Arm::Left => (7, 9, 12),
            Arm::Right => (8, 10, 11),
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Arm::Left => Arm::Right,
            Arm::Right => Arm::Left,
        }
    }
}

/// 两骨 IK 测试人形
#[derive(Clone, Debug)]
pub struct Biped {
    pub skeleton: Skeleton,
    pub target: Vec3,
    pub arm: Arm,
    /// 不做 IK，只让肩部摆动
    pub free_animate: bool,
    time: f32,
    debug_log: bool,
}

impl Biped {
    pub fn new(config: &RigConfig) -> Result<Self> {
        let skeleton = Skeleton::from_bones([
            {
                let mut hips = Bone::new("Hips");
                hips.set_local_position(Vec3::Z);
                hips
            },
            Bone::child_of("LeftLeg", 0, Vec3::new(0.0, 1.0, -0.5)),
            Bone::child_of("LeftFoot", 1, Vec3::new(0.0, 0.0, -1.0)),
            Bone::child_of("RightLeg", 0, Vec3::new(0.0, -1.0, -0.5)),
            Bone::child_of("Body", 0, Vec3::new(0.0, 0.0, 3.0)),
            Bone::child_of("RightFoot", 3, Vec3::new(0.0, 0.0, -1.0)),
            Bone::child_of("Head", 4, Vec3::Z),
            Bone::child_of("LeftShoulder", 4, Vec3::Y),
            Bone::child_of("RightShoulder", 4, Vec3::NEG_Y),
            Bone::child_of("LeftArm", 7, Vec3::new(0.0, 0.5, -1.0)),
            Bone::child_of("RightArm", 8, Vec3::new(0.0, -0.5, -1.0)),
            Bone::child_of("RightHand", 10, Vec3::new(0.0, -0.5, -0.5)),
            Bone::child_of("LeftHand", 9, Vec3::new(0.0, 0.5, -0.5)),
        ])?;

        log::info!("两骨 IK 人形已创建: {} 根骨骼", skeleton.len());
        Ok(Self {
            skeleton,
            target: DEFAULT_TARGET,
            arm: Arm::default(),
            free_animate: false,
            time: 0.0,
            debug_log: config.debug_log,
        })
    }

    /// 当前手臂的手部世界位置
    pub fn hand_position(&self) -> Vec3 {
        let (_, _, hand) = self.arm.chain();
        self.skeleton.world_position(hand)
    }

    /// 当前手臂朝目标求解一次
    pub fn solve(&mut self) {
        let (shoulder, arm, hand) = self.arm.chain();
        solve_two_bone(&mut self.skeleton, shoulder, arm, hand, self.target);
        self.skeleton.update_pose();

        if self.debug_log {
            log::debug!(
                "两骨 IK {:?}: 手到目标 {:.4}",
                self.arm,
                self.hand_position().distance(self.target)
            );
        }
    }

    /// 换另一条手臂追踪目标
    pub fn toggle_arm(&mut self) -> Arm {
        self.arm = self.arm.other();
        self.arm
    }

    /// 两肩绕 X 轴反向摆动
    pub fn animate(&mut self, dt: f32) {
        self.time += dt;
        let swing = (SHOULDER_SWING_DEGREES * self.time.sin()).to_radians();
        let (left, _, _) = Arm::Left.chain();
        let (right, _, _) = Arm::Right.chain();
        self.skeleton.set_local_rotation(left, Quat::from_rotation_x(swing));
        self.skeleton.set_local_rotation(right, Quat::from_rotation_x(-swing));
        self.skeleton.update_pose();
    }

    pub fn update(&mut self, dt: f32) {
        if self.free_animate {
            self.animate(dt);
        } else {
            self.solve();
        }
    }

    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        add_verts_for_skeleton(verts, &self.skeleton, &SkeletonStyle::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biped() -> Biped {
        Biped::new(&RigConfig::default()).unwrap()
    }

    fn arm_length(biped: &Biped) -> f32 {
        let (shoulder, arm, hand) = biped.arm.chain();
        let s = biped.skeleton.world_position(shoulder);
        let a = biped.skeleton.world_position(arm);
        let h = biped.skeleton.world_position(hand);
        s.distance(a) + a.distance(h)
    }

    #[test]
    fn test_rest_layout() {
        let biped = biped();
        assert_eq!(biped.skeleton.len(), 13);
        assert_eq!(biped.skeleton.bone_index_by_name("RightHand"), Some(11));
        assert!((biped.skeleton.world_position(8) - Vec3::new(0.0, -1.0, 4.0)).length() < 1e-5);
        assert!((biped.hand_position() - Vec3::new(0.0, -2.0, 2.5)).length() < 1e-5);
    }

    #[test]
    fn test_reachable_target() {
        let mut biped = biped();
        let length = arm_length(&biped);
        biped.target = Vec3::new(0.5, -2.0, 3.5);
        biped.solve();

        assert!(biped.hand_position().distance(biped.target) < 1e-3);
        assert!((arm_length(&biped) - length).abs() < 1e-3);
    }

    #[test]
    fn test_unreachable_target_extends_arm() {
        let mut biped = biped();
        let length = arm_length(&biped);
        biped.solve();

        let shoulder = biped.skeleton.world_position(8);
        let reach = biped.hand_position() - shoulder;
        assert!((reach.length() - length).abs() < 1e-3);
        let toward = (DEFAULT_TARGET - shoulder).normalize();
        assert!(reach.normalize().dot(toward) > 0.9999);
    }

    #[test]
    fn test_toggle_arm_switches_chain() {
        let mut biped = biped();
        assert_eq!(biped.toggle_arm(), Arm::Left);
        biped.target = Vec3::new(0.5, 2.0, 3.5);
        biped.solve();
        assert!(biped.hand_position().distance(biped.target) < 1e-3);
        // 右手未受影响
        assert!((biped.skeleton.world_position(11) - Vec3::new(0.0, -2.0, 2.5)).length() < 1e-5);
    }

    #[test]
    fn test_free_animation_swings_shoulders() {
        let mut biped = biped();
        biped.free_animate = true;
        biped.update(std::f32::consts::FRAC_PI_2);

        let left = biped.skeleton.bone(7).local_rotation;
        let right = biped.skeleton.bone(8).local_rotation;
        assert!(left.abs_diff_eq(Quat::from_rotation_x(2f32.to_radians()), 1e-5));
        assert!(right.abs_diff_eq(left.conjugate(), 1e-5));
    }
}
