//! 生物实体
//!
//! 封闭的生物集合，每个变体独占一个 Skeleton：
//! - snake: 状态机驱动的位置波 + 移动/待机行为
//! - spider: 8 条腿（可选 FABRIK）+ 毛发
//! - octopus: 浮动头部 + 卷曲触手
//!
//! 外部依赖（地形、随机数、经过时间）通过 FrameContext 逐帧注入。

mod locomotion;
mod octopus;
mod snake;
mod spider;

pub use locomotion::{Locomotion, DEFAULT_SPEED};
pub use octopus::{Octopus, ARM_COUNT};
pub use snake::Snake;
pub use spider::{Spider, SpiderLeg};

use glam::Vec3;

use crate::config::RigConfig;
use crate::geometry::{add_verts_for_skeleton, SkeletonStyle, Vertex};
use crate::random::RandomSource;
use crate::skeleton::Skeleton;
use crate::terrain::TerrainQuery;
use crate::Result;

/// 单帧注入的外部服务
pub struct FrameContext<'a> {
    pub terrain: &'a dyn TerrainQuery,
    pub rng: &'a mut dyn RandomSource,
    /// 程序启动以来的总时间（秒），驱动毛发风场
    pub elapsed: f32,
}

/// 生物
#[derive(Clone, Debug)]
pub enum Creature {
    Snake(Snake),
    Spider(Spider),
    Octopus(Octopus),
}

impl Creature {
    pub fn snake(config: &RigConfig, position: Vec3) -> Result<Self> {
        Ok(Self::Snake(Snake::new(config, position)?))
    }

    pub fn spider(config: &RigConfig, position: Vec3, rng: &mut dyn RandomSource) -> Result<Self> {
        Ok(Self::Spider(Spider::new(config, position, rng)?))
    }

    pub fn octopus(config: &RigConfig, position: Vec3) -> Result<Self> {
        Ok(Self::Octopus(Octopus::new(config, position)?))
    }

    /// 推进一帧；返回时姿态已是最新
    pub fn update(&mut self, ctx: &mut FrameContext<'_>, dt: f32) {
        match self {
            Self::Snake(snake) => snake.update(ctx, dt),
            Self::Spider(spider) => spider.update(ctx, dt),
            Self::Octopus(octopus) => octopus.update(ctx, dt),
        }
    }

    /// 生物外形的三角形顶点
    pub fn emit_geometry(&self, verts: &mut Vec<Vertex>) {
        match self {
            Self::Snake(snake) => snake.emit_geometry(verts),
            Self::Spider(spider) => spider.emit_geometry(verts),
            Self::Octopus(octopus) => octopus.emit_geometry(verts),
        }
    }

    /// 骨骼调试几何
    pub fn emit_skeleton_geometry(&self, verts: &mut Vec<Vertex>) {
        add_verts_for_skeleton(verts, self.skeleton(), &SkeletonStyle::default());
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Snake(_) => "Snake",
            Self::Spider(_) => "Spider",
            Self::Octopus(_) => "Octopus",
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        match self {
            Self::Snake(snake) => &snake.skeleton,
            Self::Spider(spider) => &spider.skeleton,
            Self::Octopus(octopus) => &octopus.skeleton,
        }
    }

    pub fn locomotion(&self) -> &Locomotion {
        match self {
            Self::Snake(snake) => &snake.locomotion,
            Self::Spider(spider) => &spider.locomotion,
            Self::Octopus(octopus) => &octopus.locomotion,
        }
    }

    pub fn locomotion_mut(&mut self) -> &mut Locomotion {
        match self {
            Self::Snake(snake) => &mut snake.locomotion,
            Self::Spider(spider) => &mut spider.locomotion,
            Self::Octopus(octopus) => &mut octopus.locomotion,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.locomotion().position
    }

    pub fn set_stationary(&mut self, stationary: bool) {
        self.locomotion_mut().stationary = stationary;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.locomotion_mut().speed = speed;
    }

    /// 开关漫游换向（蛇的换向由自身行为决定，不受影响）
    pub fn set_roaming(&mut self, roaming: bool) {
        self.locomotion_mut().roam.enabled = roaming;
    }

    /// 开关蜘蛛腿 IK，其他生物忽略
    pub fn set_leg_ik(&mut self, enabled: bool) {
        if let Self::Spider(spider) = self {
            spider.leg_ik = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_all_creatures_update_and_emit() {
        let config = RigConfig::default();
        let terrain = HeightField::hills(100, 1.0, false);
        let mut rng = StdRng::seed_from_u64(21);

        let mut creatures = vec![
            Creature::snake(&config, Vec3::new(25.0, 25.0, 0.0)).unwrap(),
            Creature::spider(&config, Vec3::new(50.0, 50.0, 0.0), &mut rng).unwrap(),
            Creature::octopus(&config, Vec3::new(40.0, 45.0, 0.0)).unwrap(),
        ];
        creatures[1].set_speed(3.5);
        creatures[1].set_roaming(true);
        creatures[1].set_leg_ik(true);

        for frame in 1..=90 {
            let mut ctx = FrameContext {
                terrain: &terrain,
                rng: &mut rng,
                elapsed: frame as f32 / 30.0,
            };
            for creature in &mut creatures {
                creature.update(&mut ctx, 1.0 / 30.0);
            }
        }

        for creature in &creatures {
            let position = creature.position();
            assert!(position.is_finite(), "{} 位置无效", creature.name());
            assert!(terrain.is_in_bounds(position.x, position.y));
            assert!((position.z - terrain.height_at(position.x, position.y)).abs() < 1e-4);
            assert!(creature.skeleton().bones().iter().all(|b| b.local_to_world.is_finite()));

            let mut verts = Vec::new();
            creature.emit_geometry(&mut verts);
            creature.emit_skeleton_geometry(&mut verts);
            assert!(!verts.is_empty());
            assert_eq!(verts.len() % 3, 0);
        }
    }

    #[test]
    fn test_stationary_creatures_stay() {
        let config = RigConfig::default();
        let terrain = HeightField::flat(50, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let start = Vec3::new(10.0, 10.0, 0.0);
        let mut octopus = Creature::octopus(&config, start).unwrap();
        octopus.set_stationary(true);

        for _ in 0..30 {
            let mut ctx = FrameContext {
                terrain: &terrain,
                rng: &mut rng,
                elapsed: 0.0,
            };
            octopus.update(&mut ctx, 0.1);
        }
        assert_eq!(octopus.position(), start);
    }
}
