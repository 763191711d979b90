//! 蛇
//!
//! 5 根骨骼，姿态完全由动画状态机驱动（沿静止方向的位置波），
//! 行为在 "移动 10 秒" 与 "原地待机 3 秒" 之间交替。

use glam::{Mat4, Quat, Vec2, Vec3};

use super::locomotion::{Locomotion, DEFAULT_SPEED};
use super::FrameContext;
use crate::animation::{wave_along_rest, AnimClip, AnimStateMachine, RestPose};
use crate::config::RigConfig;
use crate::geometry::{
    add_verts_for_cone, add_verts_for_cylinder, add_verts_for_sphere, Rgba8, Vertex,
    DEFAULT_SLICES, DEFAULT_STACKS,
};
use crate::random::RandomSource;
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

pub const STATE_IDLE: &str = "Idle";
pub const STATE_TAIL_FLICK: &str = "IdleTailFlick";
pub const STATE_HEAD_RAISE: &str = "IdleHeadRaise";
pub const STATE_SLITHER: &str = "Slither";

pub const TRIGGER_START: &str = "StartSlither";
pub const TRIGGER_STOP: &str = "StopSlither";

/// 单段移动时长（秒）
const MOVE_DURATION: f32 = 10.0;
/// 单段待机时长（秒）
const IDLE_DURATION: f32 = 3.0;
/// 片段时长（秒）
const CLIP_DURATION: f32 = 30.0;

const BODY_RADIUS: f32 = 0.25;
const HEAD_RADIUS: f32 = 0.3;

// ============================================================================
// 动画片段
// ============================================================================

fn idle_pose(skeleton: &mut Skeleton, rest: &RestPose, time: f32) {
    wave_along_rest(skeleton, rest, time, 1.0, 0.5, 0.05);
}

fn slither_pose(skeleton: &mut Skeleton, rest: &RestPose, time: f32) {
    wave_along_rest(skeleton, rest, time, 4.0, 0.7, 0.5);
}

/// 尾部两节绕 roll 轴甩动
fn tail_flick_pose(skeleton: &mut Skeleton, _: &RestPose, time: f32) {
    let flick = (time * 720.0).to_radians().sin() * 20.0;
    let rotation = Quat::from_rotation_x(flick.to_radians());
    skeleton.set_local_rotation(3, rotation);
    skeleton.set_local_rotation(4, rotation);
}

fn head_raise_pose(skeleton: &mut Skeleton, _: &RestPose, time: f32) {
    let raise = (time * 180.0).to_radians().sin() * 15.0;
    skeleton.set_local_rotation(0, Quat::from_rotation_y(raise.to_radians()));
}

// ============================================================================
// 行为
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
enum Behaviour {
    Moving { time: f32 },
    Idle { time: f32, started: bool },
}

/// 蛇
#[derive(Clone, Debug)]
pub struct Snake {
    pub skeleton: Skeleton,
    pub locomotion: Locomotion,
    pub animator: AnimStateMachine,
    rest: RestPose,
    behaviour: Behaviour,
    heading_timer: f32,
    moving: bool,
}

impl Snake {
    pub fn new(config: &RigConfig, position: Vec3) -> Result<Self> {
        let skeleton = Self::build_skeleton()?;
        let rest = RestPose::capture(&skeleton);

        let mut animator = AnimStateMachine::new();
        animator.add_state(AnimClip::new(STATE_IDLE, CLIP_DURATION, false, idle_pose));
        animator.add_state(AnimClip::new(STATE_TAIL_FLICK, CLIP_DURATION, false, tail_flick_pose));
        animator.add_state(AnimClip::new(STATE_HEAD_RAISE, CLIP_DURATION, false, head_raise_pose));
        animator.add_state(AnimClip::new(STATE_SLITHER, CLIP_DURATION, false, slither_pose));
        animator.add_transition(STATE_IDLE, TRIGGER_START, STATE_SLITHER)?;
        animator.add_transition(STATE_TAIL_FLICK, TRIGGER_START, STATE_SLITHER)?;
        animator.add_transition(STATE_SLITHER, TRIGGER_STOP, STATE_IDLE)?;
        animator.set_state(STATE_IDLE)?;

        let mut snake = Self {
            skeleton,
            locomotion: Locomotion::new(config, position, DEFAULT_SPEED, Vec2::new(85.0, 45.0)),
            animator,
            rest,
            behaviour: Behaviour::Moving { time: 0.0 },
            heading_timer: 0.0,
            moving: true,
        };
        let origin = position - snake.head_offset(&Mat4::IDENTITY);
        snake.skeleton.model_transform = Mat4::from_translation(origin);
        snake.skeleton.update_pose();

        log::info!("蛇已创建: {} 根骨骼, 位置 {position}", snake.skeleton.len());
        Ok(snake)
    }

    fn build_skeleton() -> Result<Skeleton> {
        Skeleton::from_bones([
            {
                let mut head = Bone::new("Head");
                head.local_position = Vec3::new(0.0, 3.0, 0.2);
                head
            },
            Bone::child_of("FirstCoil", 0, Vec3::new(1.0, 0.25, 0.0)),
            Bone::child_of("SecondCoil", 1, Vec3::new(1.0, -0.25, 0.0)),
            Bone::child_of("ThirdCoil", 2, Vec3::new(1.0, 0.25, 0.0)),
            Bone::child_of("Tail", 3, Vec3::new(1.0, -0.25, 0.0)),
        ])
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) {
        self.tick_behaviour(ctx.rng, dt);
        self.check_transitions();
        self.animator.update(&mut self.skeleton, &self.rest, dt);

        if self.moving {
            self.locomotion.roam.turn(dt);
            self.locomotion.advance(ctx.terrain, dt);

            // 头部落在实体位置上
            let mut basis = self.locomotion.basis(ctx.terrain);
            let origin = self.locomotion.position - self.head_offset(&basis);
            basis.w_axis = origin.extend(1.0);
            self.skeleton.model_transform = basis;
        }
        self.skeleton.update_pose();
    }

    fn head_offset(&self, rotation: &Mat4) -> Vec3 {
        rotation.transform_vector3(self.skeleton.bone(0).local_position)
    }

    /// 移动段：计时换向，到时转入待机；待机段：首帧随机挑选待机片段
    fn tick_behaviour(&mut self, rng: &mut dyn RandomSource, dt: f32) {
        if let Behaviour::Moving { time } = self.behaviour {
            self.heading_timer += dt;
            if self.heading_timer >= self.locomotion.roam.change_interval {
                self.heading_timer = 0.0;
                self.locomotion.roam.retarget_random(rng);
            }

            let time = time + dt;
            if time < MOVE_DURATION {
                self.behaviour = Behaviour::Moving { time };
                self.moving = true;
                return;
            }
            self.behaviour = Behaviour::Idle {
                time: 0.0,
                started: false,
            };
        }

        if let Behaviour::Idle { time, started } = self.behaviour {
            if !started {
                self.play_random_idle(rng);
            }
            self.moving = false;

            let time = time + dt;
            self.behaviour = if time >= IDLE_DURATION {
                Behaviour::Moving { time: 0.0 }
            } else {
                Behaviour::Idle {
                    time,
                    started: true,
                }
            };
        }
    }

    fn play_random_idle(&mut self, rng: &mut dyn RandomSource) {
        let state = match rng.int_in_range(0, 1) {
            0 => STATE_IDLE,
            _ => STATE_TAIL_FLICK,
        };
        if let Err(err) = self.animator.set_state(state) {
            log::warn!("{err}");
        }
    }

    fn check_transitions(&mut self) {
        let current = self.animator.current_state();
        if self.moving {
            if current != Some(STATE_SLITHER) {
                self.animator.trigger(TRIGGER_START);
            }
        } else if current != Some(STATE_IDLE) {
            self.animator.trigger(TRIGGER_STOP);
        }
    }

    // ========================================
    // 几何
    // ========================================

    /// 头（球 + 眼睛）、身体（球 + 圆柱）、尾（圆锥）
    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        let last = self.skeleton.len().saturating_sub(1);
        for (index, bone) in self.skeleton.bones().iter().enumerate() {
            let position = self.skeleton.world_position(index);

            if index == 0 {
                add_verts_for_sphere(verts, position, HEAD_RADIUS, Rgba8::BROWN, DEFAULT_SLICES, DEFAULT_STACKS);
                self.emit_eyes(verts, &bone.local_to_world, position);
                continue;
            }

            let Some(parent) = bone.parent_id() else {
                continue;
            };
            let parent_position = self.skeleton.world_position(parent);
            if index == last {
                add_verts_for_cone(verts, parent_position, position, BODY_RADIUS, Rgba8::BROWN, 24);
            } else {
                add_verts_for_sphere(verts, position, BODY_RADIUS, Rgba8::BROWN, DEFAULT_SLICES, DEFAULT_STACKS);
                add_verts_for_cylinder(verts, parent_position, position, BODY_RADIUS, Rgba8::BROWN, 8);
            }
        }
    }

    fn emit_eyes(&self, verts: &mut Vec<Vertex>, head: &Mat4, position: Vec3) {
        let forward = head.x_axis.truncate();
        let left = head.y_axis.truncate();
        let up = head.z_axis.truncate();
        let pupil_offset = forward * 0.03;

        for side in [1.0, -1.0] {
            let eye = position - forward * 0.2 + left * (0.1 * side) + up * 0.25;
            add_verts_for_sphere(verts, eye, 0.05, Rgba8::WHITE, DEFAULT_SLICES, DEFAULT_STACKS);
            add_verts_for_sphere(verts, eye - pupil_offset, 0.025, Rgba8::BLACK, DEFAULT_SLICES, DEFAULT_STACKS);
        }
    }
}
