//! FABRIK 测试链
//!
//! 沿 +Z 的单位长度竖直链，可以在尾部增删关节。
//! 每次求解都对整条链现算段长度。

use glam::Vec3;

use crate::config::RigConfig;
use crate::geometry::{add_verts_for_skeleton, SkeletonStyle, Vertex};
use crate::ik::{solve_fabrik, FabrikOutcome};
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

/// 默认段数（6 个关节）
pub const DEFAULT_SEGMENTS: usize = 5;

/// 可变长度的 FABRIK 测试链
#[derive(Clone, Debug)]
pub struct TestChain {
    pub skeleton: Skeleton,
    time: f32,
    debug_log: bool,
}

impl TestChain {
    pub fn new(config: &RigConfig, segments: usize) -> Result<Self> {
        let mut bones = vec![Bone::new("bone_0")];
        for i in 1..=segments {
            bones.push(Bone::child_of(format!("bone_{i}"), i - 1, Vec3::Z));
        }
        let skeleton = Skeleton::from_bones(bones)?;

        log::info!("FABRIK 测试链已创建: {} 个关节", skeleton.len());
        Ok(Self {
            skeleton,
            time: 0.0,
            debug_log: config.debug_log,
        })
    }

    /// 在尾部追加一个单位长度关节
    pub fn add_joint(&mut self) -> Result<usize> {
        let parent = self.skeleton.len() - 1;
        let index = self
            .skeleton
            .push_bone(Bone::child_of(format!("bone_{}", parent + 1), parent, Vec3::Z))?;
        self.skeleton.update_pose();
        Ok(index)
    }

    /// 移除尾部关节；只剩根时不动
    pub fn remove_joint(&mut self) -> bool {
        if self.skeleton.len() <= 1 {
            return false;
        }
        self.skeleton.pop_bone();
        self.skeleton.update_pose();
        true
    }

    /// 根到末端的整条链
    pub fn chain(&self) -> Vec<usize> {
        (0..self.skeleton.len()).collect()
    }

    pub fn end_position(&self) -> Vec3 {
        self.skeleton.world_position(self.skeleton.len() - 1)
    }

    pub fn solve(&mut self, target: Vec3) -> FabrikOutcome {
        let chain = self.chain();
        let outcome = solve_fabrik(&mut self.skeleton, &chain, target);
        self.skeleton.update_pose();
        if self.debug_log {
            log::debug!(
                "FABRIK 测试链 {:?}: 末端距离 {:.4}",
                outcome,
                self.end_position().distance(target)
            );
        }
        outcome
    }

    /// 目标沿 Y 来回摆动
    pub fn animated_target(time: f32) -> Vec3 {
        Vec3::new(0.0, (time * 2.0).sin() * 5.0, 0.5)
    }

    pub fn update(&mut self, dt: f32) -> FabrikOutcome {
        self.time += dt;
        self.solve(Self::animated_target(self.time))
    }

    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        add_verts_for_skeleton(verts, &self.skeleton, &SkeletonStyle::default());
    }
}
