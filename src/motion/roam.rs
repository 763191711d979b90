//! 漫游转向与地形贴合
//!
//! 漫游：定时随机挑选新航向，实际移动方向用缓动球面插值逐渐转过去。
//! 地形基：由中心、前方、左方三个高度采样构造 (前, 左, 上) 正交基，
//! 整套骨骼重定位到这个基上，角色会随坡度倾斜。

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::config::RigConfig;
use crate::random::RandomSource;
use crate::terrain::TerrainQuery;

/// 三次缓动 3t² - 2t³
#[inline]
pub fn smoothstep3(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// 两个单位方向之间的球面插值
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let (Some(a), Some(b)) = (from.try_normalize(), to.try_normalize()) else {
        return to;
    };
    let arc = Quat::from_rotation_arc(a, b);
    Quat::IDENTITY.slerp(arc, t) * a
}

/// XY 平面上角度（度）对应的单位方向
#[inline]
pub fn heading_from_degrees(degrees: f32) -> Vec3 {
    let radians = degrees.to_radians();
    Vec3::new(radians.cos(), radians.sin(), 0.0)
}

/// 漫游状态
#[derive(Clone, Debug)]
pub struct Roam {
    /// 关闭时不再挑选新航向，但已开始的转向仍会完成
    pub enabled: bool,
    /// 当前移动方向
    pub move_direction: Vec3,
    /// 目标移动方向
    pub target_direction: Vec3,
    /// 挑选新航向的间隔（秒）
    pub change_interval: f32,
    /// 转向插值时长（秒）
    pub turn_duration: f32,
    change_timer: f32,
    turn_time: f32,
}

impl Roam {
    pub fn new(direction: Vec3, change_interval: f32, turn_duration: f32) -> Self {
        Self {
            enabled: false,
            move_direction: direction,
            target_direction: direction,
            change_interval,
            turn_duration,
            change_timer: 0.0,
            turn_time: 0.0,
        }
    }

    pub fn from_config(config: &RigConfig, direction: Vec3) -> Self {
        Self::new(direction, config.roam_change_interval, config.roam_turn_duration)
    }

    /// 设置新的目标航向，重新开始转向插值
    pub fn retarget(&mut self, direction: Vec3) {
        self.target_direction = direction.try_normalize().unwrap_or(self.move_direction);
        self.turn_time = 0.0;
    }

    /// 随机挑选一个水平航向
    pub fn retarget_random(&mut self, rng: &mut dyn RandomSource) {
        let degrees = rng.float_in_range(0.0, 360.0);
        self.retarget(heading_from_degrees(degrees));
    }

    /// 推进计时器；启用时到点换航向，然后向目标方向插值
    pub fn update(&mut self, rng: &mut dyn RandomSource, dt: f32) {
        self.change_timer += dt;
        if self.enabled && self.change_timer >= self.change_interval {
            self.change_timer = 0.0;
            self.retarget_random(rng);
        }
        self.turn(dt);
    }

    /// 只做转向插值
    pub fn turn(&mut self, dt: f32) {
        if (self.move_direction - self.target_direction).length_squared() <= 1e-8 {
            return;
        }
        self.turn_time += dt;
        let fraction = if self.turn_duration > 0.0 {
            (self.turn_time / self.turn_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = smoothstep3(fraction);
        self.move_direction = slerp_direction(self.move_direction, self.target_direction, eased)
            .try_normalize()
            .unwrap_or(self.target_direction);
    }

    /// 重置换向计时
    pub fn reset_timer(&mut self) {
        self.change_timer = 0.0;
    }

    #[inline]
    pub fn change_timer(&self) -> f32 {
        self.change_timer
    }
}

/// 地形切线基
///
/// forward = norm(dir.x, dir.y, h前 - h中)
/// left    = norm(dir.y, -dir.x, h左 - h中)
/// up      = norm(left × forward)，再用 forward × up 重新正交化 left。
/// 返回的矩阵列依次为 forward、left、up，平移为 `position`。
pub fn terrain_basis(
    terrain: &dyn TerrainQuery,
    position: Vec3,
    direction: Vec3,
    probe_offset: f32,
) -> Mat4 {
    let h_center = terrain.height_at(position.x, position.y);
    let h_forward = terrain.height_at(
        position.x + direction.x * probe_offset,
        position.y + direction.y * probe_offset,
    );
    let h_left = terrain.height_at(
        position.x + direction.y * probe_offset,
        position.y - direction.x * probe_offset,
    );

    let forward = Vec3::new(direction.x, direction.y, h_forward - h_center)
        .try_normalize()
        .unwrap_or(Vec3::X);
    let left = Vec3::new(direction.y, -direction.x, h_left - h_center)
        .try_normalize()
        .unwrap_or(Vec3::Y);
    let up = left.cross(forward).try_normalize().unwrap_or(Vec3::Z);
    let left = forward.cross(up).try_normalize().unwrap_or(left);

    Mat4::from_cols(
        forward.extend(0.0),
        left.extend(0.0),
        up.extend(0.0),
        Vec4::new(position.x, position.y, position.z, 1.0),
    )
}
