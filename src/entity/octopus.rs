//! 章鱼
//!
//! 头部 + 8 条三节触手。头部上下浮动，触手绕 Z 轴卷曲，
//! 卷曲幅度随浮动高度变化。

use glam::{Mat4, Quat, Vec2, Vec3};

use super::locomotion::Locomotion;
use super::FrameContext;
use crate::config::RigConfig;
use crate::geometry::{
    add_verts_for_cone, add_verts_for_cylinder, add_verts_for_sphere, Rgba8, Vertex, DEFAULT_SLICES,
    DEFAULT_STACKS,
};
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

pub const ARM_COUNT: usize = 8;

const OCTOPUS_SPEED: f32 = 1.0;
const ARM_RADIUS: f32 = 0.08;

/// 章鱼
#[derive(Clone, Debug)]
pub struct Octopus {
    pub skeleton: Skeleton,
    pub locomotion: Locomotion,
    head_rest: Vec3,
    time: f32,
}

impl Octopus {
    pub fn new(config: &RigConfig, position: Vec3) -> Result<Self> {
        let mut skeleton = Self::build_skeleton()?;
        skeleton.model_transform = Mat4::from_translation(position);
        skeleton.update_pose();

        let mut locomotion = Locomotion::new(config, position, OCTOPUS_SPEED, Vec2::new(85.0, 35.0));
        locomotion.roam.enabled = true;

        log::info!("章鱼已创建: {} 根骨骼", skeleton.len());
        Ok(Self {
            head_rest: skeleton.bone(0).local_position,
            skeleton,
            locomotion,
            time: 0.0,
        })
    }

    /// 触手按 45° 等分，每节沿同一方向缩短为上一节的 0.7
    fn build_skeleton() -> Result<Skeleton> {
        let mut skeleton = Skeleton::new();
        let mut head = Bone::new("Head");
        head.set_local_rotation(Quat::from_rotation_z(90f32.to_radians()));
        skeleton.push_bone(head)?;

        for arm in 0..ARM_COUNT {
            let angle = (arm as f32 * 360.0 / ARM_COUNT as f32).to_radians();
            let base = Vec3::new(angle.cos(), angle.sin(), -0.2);
            let segment = base * 0.7;
            let number = arm + 1;

            let base_index = skeleton.push_bone(Bone::child_of(format!("Arm{number}_Base"), 0, base))?;
            let mid_index = skeleton.push_bone(Bone::child_of(format!("Arm{number}_Mid"), base_index, segment))?;
            skeleton.push_bone(Bone::child_of(format!("Arm{number}_Tip"), mid_index, segment))?;
        }

        skeleton.update_pose();
        Ok(skeleton)
    }

    pub fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) {
        self.time += dt;

        if !self.locomotion.stationary {
            self.locomotion.roam.update(ctx.rng, dt);
            if self.locomotion.advance(ctx.terrain, dt) {
                self.time = 0.0;
            }
        }

        let bob = (self.time * 2.0).sin() * 0.5;
        self.skeleton.set_local_position(0, self.head_rest + Vec3::new(0.0, 0.0, bob));

        let strength = bob + 0.5;
        for index in 1..self.skeleton.len() {
            let wave = (self.time * 3.0 + index as f32 * 0.4).sin();
            let curl = wave * 0.4 * strength;
            self.skeleton.set_local_rotation(index, Quat::from_rotation_z(curl));
        }

        self.skeleton.model_transform = self.locomotion.basis(ctx.terrain);
        self.skeleton.update_pose();
    }

    /// 头（两个球 + 眼睛），触手段为圆柱，末节为圆锥
    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        let head = &self.skeleton.bone(0).local_to_world;
        let head_position = self.skeleton.world_position(0);
        let i = head.x_axis.truncate();
        let k = head.z_axis.truncate();

        add_verts_for_sphere(
            verts,
            head_position - k * 0.4,
            0.8,
            Rgba8::rgb(180, 40, 180),
            DEFAULT_SLICES,
            DEFAULT_STACKS,
        );
        add_verts_for_sphere(verts, head_position, 0.25, Rgba8::rgb(200, 60, 200), DEFAULT_SLICES, DEFAULT_STACKS);

        let eye_offset = i * 0.6 + k * 0.025;
        for eye in [head_position + eye_offset, head_position - eye_offset] {
            add_verts_for_sphere(verts, eye, 0.12, Rgba8::BLACK, DEFAULT_SLICES, DEFAULT_STACKS);
        }

        for (index, bone) in self.skeleton.bones().iter().enumerate().skip(1) {
            let Some(parent) = bone.parent_id() else {
                continue;
            };
            let start = self.skeleton.world_position(parent);
            let end = self.skeleton.world_position(index);
            if bone.name.ends_with("_Tip") {
                add_verts_for_cone(verts, start, end, ARM_RADIUS, Rgba8::rgb(160, 30, 160), DEFAULT_SLICES);
            } else {
                add_verts_for_cylinder(verts, start, end, ARM_RADIUS, Rgba8::rgb(150, 35, 150), DEFAULT_SLICES);
            }
        }
    }
}
