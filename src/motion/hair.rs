//! Verlet 毛发
//!
//! 每根毛发挂在一根骨骼上：根偏移与静止方向都在骨骼本地空间，
//! 每帧从骨骼当前世界变换重新投影出世界根点，尖端用 Verlet 积分，
//! 再做长度约束松弛，并以很小的比例拉回静止方向。
//! 必须在姿态更新之后运行。

use glam::{Mat4, Vec3};

use crate::config::RigConfig;
use crate::geometry::{add_verts_for_cylinder, Rgba8, Vertex};
use crate::random::RandomSource;
use crate::skeleton::{Bone, Skeleton};

/// 毛发粗细
const HAIR_RADIUS: f32 = 0.002;
/// 毛发圆柱的经线数
const HAIR_SLICES: u32 = 4;

/// 毛发模拟参数
#[derive(Clone, Copy, Debug)]
pub struct HairParams {
    pub gravity: Vec3,
    pub damping: f32,
    pub constraint_iterations: u32,
    pub rest_bias: f32,
    pub wind_strength: f32,
}

impl HairParams {
    pub fn from_config(config: &RigConfig) -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, config.hair_gravity_z),
            damping: config.hair_damping,
            constraint_iterations: config.hair_constraint_iterations,
            rest_bias: config.hair_rest_bias,
            wind_strength: config.hair_wind_strength,
        }
    }
}

impl Default for HairParams {
    fn default() -> Self {
        Self::from_config(&RigConfig::default())
    }
}

/// 单根毛发
#[derive(Clone, Debug)]
pub struct HairStrand {
    /// 所属骨骼
    pub bone: usize,
    /// 骨骼本地空间的根偏移
    pub local_offset: Vec3,
    /// 骨骼本地空间的静止方向（单位向量）
    pub local_direction: Vec3,
    pub length: f32,
    pub color: Rgba8,
    /// 尖端世界位置
    pub tip: Vec3,
    /// 上一帧尖端世界位置
    pub prev_tip: Vec3,
}

impl HairStrand {
    /// 尖端初始化在静止位置
    pub fn new(
        skeleton: &Skeleton,
        bone: usize,
        local_offset: Vec3,
        local_direction: Vec3,
        length: f32,
        color: Rgba8,
    ) -> Self {
        let mut strand = Self {
            bone,
            local_offset,
            local_direction: local_direction.try_normalize().unwrap_or(Vec3::Z),
            length,
            color,
            tip: Vec3::ZERO,
            prev_tip: Vec3::ZERO,
        };
        let (_, rest_tip) = strand.anchor(&skeleton.bone(bone).local_to_world);
        strand.tip = rest_tip;
        strand.prev_tip = rest_tip;
        strand
    }

    /// 随机生成：根偏移在骨骼上方的小盒内，方向偏向本地 +Z
    pub fn random(skeleton: &Skeleton, bone: usize, rng: &mut dyn RandomSource) -> Self {
        let local_offset = Vec3::new(
            rng.float_in_range(-1.0, 1.0) * 0.05,
            rng.float_in_range(-1.0, 1.0) * 0.05,
            rng.float_in_range(0.0, 1.0) * 0.05,
        );

        let random_dir = Vec3::new(
            rng.float_in_range(-1.0, 1.0),
            rng.float_in_range(-1.0, 1.0),
            rng.float_in_range(0.0, 1.0),
        )
        .try_normalize()
        .unwrap_or(Vec3::Z);
        let variation = 0.75;
        let local_direction = Vec3::Z * (1.0 - variation) + random_dir * variation;

        let length = 0.25 * rng.float_in_range(0.8, 1.5);
        let mut channel = || rng.int_in_range(80, 150).clamp(0, 255) as u8;
        let color = Rgba8::rgb(channel(), channel(), channel());

        Self::new(skeleton, bone, local_offset, local_direction, length, color)
    }

    /// 由骨骼世界变换求 (世界根点, 静止尖端)
    #[inline]
    pub fn anchor(&self, bone_to_world: &Mat4) -> (Vec3, Vec3) {
        let root = bone_to_world.transform_point3(self.local_offset);
        let direction = bone_to_world
            .transform_vector3(self.local_direction)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        (root, root + direction * self.length)
    }

    /// 推进一帧，风的相位由经过时间与骨骼序号决定
    pub fn step(&mut self, bone_to_world: &Mat4, params: &HairParams, elapsed: f32, dt: f32) {
        let (root, rest_tip) = self.anchor(bone_to_world);

        // Verlet 积分
        let velocity = (self.tip - self.prev_tip) * params.damping;
        let next = self.tip + velocity + params.gravity * (dt * dt);
        self.prev_tip = self.tip;
        self.tip = next;

        let phase = self.bone as f32;
        let wind = Vec3::new(
            (elapsed * 2.0 + phase).sin() * params.wind_strength,
            (elapsed * 3.0 + phase).cos() * params.wind_strength,
            0.0,
        );

        // 长度约束，每次消除一半误差
        for _ in 0..params.constraint_iterations {
            let to_tip = self.tip - root;
            let current = to_tip.length();
            if current > 0.0 {
                let error = current - self.length;
                self.tip -= to_tip / current * error * 0.5;
            }
            self.tip += wind * dt;
        }

        // 缓慢回到静止方向
        self.tip += (rest_tip - self.tip) * params.rest_bias;
    }
}

/// 一个实体的全部毛发
#[derive(Clone, Debug, Default)]
pub struct HairSystem {
    pub strands: Vec<HairStrand>,
    pub params: HairParams,
}

impl HairSystem {
    pub fn new(params: HairParams) -> Self {
        Self {
            strands: Vec::new(),
            params,
        }
    }

    /// 按骨骼逐根生成，`count_for` 决定每根骨骼的毛发数
    pub fn grow(
        &mut self,
        skeleton: &Skeleton,
        rng: &mut dyn RandomSource,
        count_for: impl Fn(&Bone) -> usize,
    ) {
        for (index, bone) in skeleton.bones().iter().enumerate() {
            for _ in 0..count_for(bone) {
                self.strands.push(HairStrand::random(skeleton, index, rng));
            }
        }
    }

    /// 推进全部毛发一帧；要求姿态已是最新
    pub fn simulate(&mut self, skeleton: &Skeleton, elapsed: f32, dt: f32) {
        for strand in &mut self.strands {
            let bone_to_world = skeleton.bone(strand.bone).local_to_world;
            strand.step(&bone_to_world, &self.params, elapsed, dt);
        }
    }

    /// 每根毛发输出一根 根点 → 尖端 的细圆柱
    pub fn emit_geometry(&self, skeleton: &Skeleton, verts: &mut Vec<Vertex>) {
        for strand in &self.strands {
            let (root, _) = strand.anchor(&skeleton.bone(strand.bone).local_to_world);
            add_verts_for_cylinder(verts, root, strand.tip, HAIR_RADIUS, strand.color, HAIR_SLICES);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }
}
