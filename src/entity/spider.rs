//! 蜘蛛
//!
//! 腹部 + 头部 + 8 条腿（股节、胫节、后跗节、跗节）。
//! 每帧：漫游转向 → 前进贴地 → 股节摆动 → 地形基 → 姿态更新
//! → 计算落脚点 → （可选）逐腿 FABRIK → 毛发模拟。

use glam::{Mat4, Quat, Vec2, Vec3};

use super::locomotion::Locomotion;
use super::FrameContext;
use crate::config::RigConfig;
use crate::geometry::{add_verts_for_cylinder, add_verts_for_sphere, Rgba8, Vertex, DEFAULT_SLICES, DEFAULT_STACKS};
use crate::ik::{FabrikChain, FabrikOutcome};
use crate::motion::{HairParams, HairSystem};
use crate::random::RandomSource;
use crate::skeleton::{Bone, Skeleton};
use crate::Result;

/// 默认移动速度
const SPIDER_SPEED: f32 = 2.5;
/// 身体球与骨段圆柱的半径
const BODY_RADIUS: f32 = 0.25;

/// 骨骼表：(名称, 父索引, 本地位置)，按拓扑序
const SPIDER_BONES: [(&str, i32, [f32; 3]); 34] = [
    ("Abdomen", -1, [0.0, 0.0, 0.75]),
    ("Head", 0, [-0.4, 0.0, 0.0]),
    // 左前腿
    ("LeftFrontFemur", 1, [-0.4, 0.25, 0.5]),
    ("LeftFrontTibia", 2, [-0.4, 0.25, 0.0]),
    ("LeftFrontMetaTarsus", 3, [-0.2, 0.25, -0.5]),
    ("LeftFrontTarsus", 4, [-0.2, 0.25, -0.5]),
    // 右前腿
    ("RightFrontFemur", 1, [-0.4, -0.25, 0.5]),
    ("RightFrontTibia", 6, [-0.4, -0.25, 0.0]),
    ("RightFrontMetaTarsus", 7, [-0.2, -0.25, -0.5]),
    ("RightFrontTarsus", 8, [-0.2, -0.25, -0.5]),
    // 左前中腿
    ("LeftFrontMidFemur", 1, [-0.15, 0.5, 0.0]),
    ("LeftFrontMiddleTibia", 10, [-0.15, 0.25, 0.0]),
    ("LeftFrontMiddleMetaTarsus", 11, [-0.15, 0.15, -0.3]),
    ("LeftFrontMiddleTarsus", 12, [-0.15, 0.1, -0.2]),
    // 右前中腿
    ("RightFrontMidFemur", 1, [-0.15, -0.5, 0.0]),
    ("RightFrontMiddleTibia", 14, [-0.15, -0.25, 0.0]),
    ("RightFrontMiddleMetaTarsus", 15, [-0.15, -0.15, -0.3]),
    ("RightFrontMiddleTarsus", 16, [-0.15, -0.1, -0.2]),
    // 左后中腿
    ("LeftBackMidFemur", 1, [0.15, 0.5, 0.0]),
    ("LeftBackMiddleTibia", 18, [0.15, 0.25, 0.0]),
    ("LeftBackMiddleMetaTarsus", 19, [0.15, 0.15, -0.3]),
    ("LeftBackMiddleTarsus", 20, [0.15, 0.1, -0.2]),
    // 右后中腿
    ("RightBackMidFemur", 1, [0.15, -0.5, 0.0]),
    ("RightBackMiddleTibia", 22, [0.15, -0.25, 0.0]),
    ("RightBackMiddleMetaTarsus", 23, [0.15, -0.15, -0.3]),
    ("RightBackMiddleTarsus", 24, [0.15, -0.1, -0.2]),
    // 左后腿
    ("LeftBackFemur", 1, [0.4, 0.25, 0.5]),
    ("LeftBackTibia", 26, [0.4, 0.25, 0.0]),
    ("LeftBackMetaTarsus", 27, [0.2, 0.25, -0.5]),
    ("LeftBackTarsus", 28, [0.2, 0.25, -0.5]),
    // 右后腿
    ("RightBackFemur", 1, [0.4, -0.25, 0.5]),
    ("RightBackTibia", 30, [0.4, -0.25, 0.0]),
    ("RightBackMetaTarsus", 31, [0.2, -0.25, -0.5]),
    ("RightBackTarsus", 32, [0.2, -0.25, -0.5]),
];

/// 腿表：4 根骨骼名 + 模型空间的默认落脚偏移
const SPIDER_LEGS: [([&str; 4], [f32; 3]); 8] = [
    (["LeftFrontFemur", "LeftFrontTibia", "LeftFrontMetaTarsus", "LeftFrontTarsus"], [-0.4, 0.25, -0.5]),
    (["RightFrontFemur", "RightFrontTibia", "RightFrontMetaTarsus", "RightFrontTarsus"], [-0.4, -0.25, -0.5]),
    (
        ["LeftFrontMidFemur", "LeftFrontMiddleTibia", "LeftFrontMiddleMetaTarsus", "LeftFrontMiddleTarsus"],
        [-0.15, 0.5, 0.0],
    ),
    (
        ["RightFrontMidFemur", "RightFrontMiddleTibia", "RightFrontMiddleMetaTarsus", "RightFrontMiddleTarsus"],
        [-0.15, -0.5, 0.0],
    ),
    (
        ["LeftBackMidFemur", "LeftBackMiddleTibia", "LeftBackMiddleMetaTarsus", "LeftBackMiddleTarsus"],
        [0.15, 0.5, 0.0],
    ),
    (
        ["RightBackMidFemur", "RightBackMiddleTibia", "RightBackMiddleMetaTarsus", "RightBackMiddleTarsus"],
        [0.15, -0.5, 0.0],
    ),
    (["LeftBackFemur", "LeftBackTibia", "LeftBackMetaTarsus", "LeftBackTarsus"], [0.4, 0.25, 0.5]),
    (["RightBackFemur", "RightBackTibia", "RightBackMetaTarsus", "RightBackTarsus"], [0.4, -0.25, 0.5]),
];

/// 蜘蛛腿
#[derive(Clone, Debug)]
pub struct SpiderLeg {
    /// 股节 → 跗节，段长度缓存在链上
    pub chain: FabrikChain,
    /// 模型空间的默认落脚偏移
    pub default_foot_offset: Vec3,
    /// 本帧的世界落脚目标
    pub foot_target: Vec3,
}

/// 蜘蛛
#[derive(Clone, Debug)]
pub struct Spider {
    pub skeleton: Skeleton,
    pub locomotion: Locomotion,
    pub legs: Vec<SpiderLeg>,
    pub hair: HairSystem,
    /// 是否逐腿运行 FABRIK
    pub leg_ik: bool,
    foot_clearance: f32,
    time: f32,
}

/// 每根骨骼的毛发数：腹部最多，头部次之
fn hair_count(bone: &Bone) -> usize {
    if bone.name.contains("Abdomen") {
        100
    } else if bone.name.contains("Head") {
        50
    } else {
        20
    }
}

impl Spider {
    pub fn new(config: &RigConfig, position: Vec3, rng: &mut dyn RandomSource) -> Result<Self> {
        let mut skeleton = Self::build_skeleton()?;
        skeleton.model_transform = Mat4::from_translation(position);
        skeleton.update_pose();

        let legs = SPIDER_LEGS
            .iter()
            .map(|(names, offset)| -> Result<SpiderLeg> {
                let joints = names
                    .iter()
                    .map(|name| skeleton.require_bone(name))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SpiderLeg {
                    chain: FabrikChain::new(&skeleton, joints)?,
                    default_foot_offset: Vec3::from_array(*offset),
                    foot_target: Vec3::ZERO,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut hair = HairSystem::new(HairParams::from_config(config));
        hair.grow(&skeleton, rng, hair_count);

        log::info!(
            "蜘蛛已创建: {} 根骨骼, {} 条腿, {} 根毛发",
            skeleton.len(),
            legs.len(),
            hair.len()
        );

        Ok(Self {
            skeleton,
            locomotion: Locomotion::new(config, position, SPIDER_SPEED, Vec2::new(85.0, 35.0)),
            legs,
            hair,
            leg_ik: false,
            foot_clearance: config.foot_clearance,
            time: 0.0,
        })
    }

    fn build_skeleton() -> Result<Skeleton> {
        Skeleton::from_bones(SPIDER_BONES.iter().map(|&(name, parent, position)| {
            let mut bone = Bone::new(name);
            bone.parent_index = parent;
            bone.local_position = Vec3::from_array(position);
            bone
        }))
    }

    pub fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) {
        self.time += dt;

        self.locomotion.roam.update(ctx.rng, dt);
        if self.locomotion.advance(ctx.terrain, dt) {
            self.time = 0.0;
        }

        self.sway_femurs();

        self.skeleton.model_transform = self.locomotion.basis(ctx.terrain);
        self.skeleton.update_pose();

        self.place_feet(ctx);
        if self.leg_ik {
            for leg in &self.legs {
                if leg.chain.solve(&mut self.skeleton, leg.foot_target) == FabrikOutcome::Extended {
                    log::trace!("腿 {:?} 够不到落脚点", leg.chain.joints);
                }
            }
        }

        self.hair.simulate(&self.skeleton, ctx.elapsed, dt);
    }

    /// 股节绕本地 X 轴摆动，相位随骨骼序号变化
    fn sway_femurs(&mut self) {
        for index in 0..self.skeleton.len() {
            if !self.skeleton.bone(index).name.contains("Femur") {
                continue;
            }
            let angle = (self.time * index as f32 * 0.4).sin() * 0.5;
            self.skeleton.set_local_rotation(index, Quat::from_axis_angle(Vec3::X, angle));
        }
    }

    /// 默认落脚偏移变换到世界，再贴合地形
    fn place_feet(&mut self, ctx: &FrameContext<'_>) {
        let model = self.skeleton.model_transform;
        for leg in &mut self.legs {
            let mut target = model.transform_point3(leg.default_foot_offset);
            target.z = ctx.terrain.height_at(target.x, target.y) + self.foot_clearance;
            leg.foot_target = target;
        }
    }

    /// 黑色关节球 + 骨段圆柱 + 毛发
    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        for (index, bone) in self.skeleton.bones().iter().enumerate() {
            let position = self.skeleton.world_position(index);
            add_verts_for_sphere(verts, position, BODY_RADIUS, Rgba8::BLACK, DEFAULT_SLICES, DEFAULT_STACKS);

            if let Some(parent) = bone.parent_id() {
                let start = self.skeleton.world_position(parent);
                add_verts_for_cylinder(verts, start, position, BODY_RADIUS, Rgba8::BLACK, DEFAULT_SLICES);
            }
        }
        self.hair.emit_geometry(&self.skeleton, verts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spider(rng: &mut StdRng) -> Spider {
        Spider::new(&RigConfig::default(), Vec3::new(30.0, 30.0, 0.0), rng).unwrap()
    }

    #[test]
    fn test_rig_layout() {
        let mut rng = StdRng::seed_from_u64(5);
        let spider = spider(&mut rng);

        assert_eq!(spider.skeleton.len(), 34);
        assert_eq!(spider.legs.len(), 8);
        for leg in &spider.legs {
            assert_eq!(leg.chain.joints.len(), 4);
            assert_eq!(leg.chain.lengths.len(), 3);
            assert!(leg.chain.lengths.iter().all(|&l| l > 0.0));
        }
        // 腹部 100 + 头部 50 + 32 根腿骨各 20
        assert_eq!(spider.hair.len(), 100 + 50 + 32 * 20);
    }

    #[test]
    fn test_update_keeps_leg_lengths_with_ik() {
        let terrain = HeightField::flat(100, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut spider = spider(&mut rng);
        spider.leg_ik = true;
        spider.locomotion.roam.enabled = true;

        for frame in 1..=60 {
            let mut ctx = FrameContext {
                terrain: &terrain,
                rng: &mut rng,
                elapsed: frame as f32 / 30.0,
            };
            spider.update(&mut ctx, 1.0 / 30.0);
        }

        for leg in &spider.legs {
            for (pair, &length) in leg.chain.joints.windows(2).zip(&leg.chain.lengths) {
                let d = spider.skeleton.world_position(pair[0]).distance(spider.skeleton.world_position(pair[1]));
                assert!((d - length).abs() < 1e-3);
            }
            assert!((leg.foot_target.z - 0.05).abs() < 1e-5);
        }
        for strand in &spider.hair.strands {
            assert!(strand.tip.is_finite());
        }
    }

    #[test]
    fn test_stationary_spider_stays_put() {
        let terrain = HeightField::flat(100, 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(2);
        let mut spider = spider(&mut rng);
        spider.locomotion.stationary = true;

        let mut ctx = FrameContext {
            terrain: &terrain,
            rng: &mut rng,
            elapsed: 0.1,
        };
        spider.update(&mut ctx, 0.1);
        assert_eq!(spider.locomotion.position, Vec3::new(30.0, 30.0, 0.0));
        assert!((spider.skeleton.world_position(0) - Vec3::new(30.0, 30.0, 0.75)).length() < 1e-4);
    }
}
