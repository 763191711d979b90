//! 地面移动
//!
//! 三种生物共用：沿航向反方向前进、贴地、出界后回到重生点，
//! 并由地形切线基给出模型变换。

use glam::{Mat4, Vec2, Vec3};

use crate::config::RigConfig;
use crate::motion::{terrain_basis, Roam};
use crate::terrain::TerrainQuery;

/// 默认移动速度
pub const DEFAULT_SPEED: f32 = 1.5;

/// 地面移动状态
#[derive(Clone, Debug)]
pub struct Locomotion {
    /// 世界位置，z 始终贴合地形
    pub position: Vec3,
    pub speed: f32,
    /// 静止的生物只做原地动画
    pub stationary: bool,
    pub roam: Roam,
    /// 出界后的重生点 (x, y)
    pub respawn: Vec2,
    /// 地形采样偏移
    pub probe_offset: f32,
}

impl Locomotion {
    pub fn new(config: &RigConfig, position: Vec3, speed: f32, respawn: Vec2) -> Self {
        Self {
            position,
            speed,
            stationary: false,
            roam: Roam::from_config(config, Vec3::X),
            respawn,
            probe_offset: config.terrain_probe_offset,
        }
    }

    /// 当前移动方向
    #[inline]
    pub fn heading(&self) -> Vec3 {
        self.roam.move_direction
    }

    /// 前进一帧并贴地；出界时回到重生点并返回 true
    pub fn advance(&mut self, terrain: &dyn TerrainQuery, dt: f32) -> bool {
        if self.stationary {
            return false;
        }

        self.position -= self.heading() * self.speed * dt;
        self.snap_to_ground(terrain);

        if !terrain.is_in_bounds(self.position.x, self.position.y) {
            let (x, y) = (self.respawn.x, self.respawn.y);
            self.position = Vec3::new(x, y, terrain.height_at(x, y));
            log::debug!("生物出界，回到重生点 ({x}, {y})");
            return true;
        }
        false
    }

    /// z 设为当前 (x, y) 处的地形高度
    pub fn snap_to_ground(&mut self, terrain: &dyn TerrainQuery) {
        self.position.z = terrain.height_at(self.position.x, self.position.y);
    }

    /// 以当前位置、航向构建的地形切线基
    pub fn basis(&self, terrain: &dyn TerrainQuery) -> Mat4 {
        terrain_basis(terrain, self.position, self.heading(), self.probe_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightField;

    fn walker(position: Vec3) -> Locomotion {
        Locomotion::new(&RigConfig::default(), position, 2.0, Vec2::new(10.0, 12.0))
    }

    #[test]
    fn test_moves_against_heading_and_snaps() {
        let terrain = HeightField::flat(40, 1.0, 3.0);
        let mut walker = walker(Vec3::new(20.0, 20.0, 0.0));

        assert!(!walker.advance(&terrain, 0.5));
        assert!((walker.position - Vec3::new(19.0, 20.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_respawns_when_out_of_bounds() {
        let terrain = HeightField::flat(40, 1.0, 1.0);
        let mut walker = walker(Vec3::new(0.5, 20.0, 0.0));

        assert!(walker.advance(&terrain, 1.0));
        assert!((walker.position - Vec3::new(10.0, 12.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_stationary_does_not_move() {
        let terrain = HeightField::flat(40, 1.0, 1.0);
        let mut walker = walker(Vec3::new(20.0, 20.0, 0.0));
        walker.stationary = true;

        assert!(!walker.advance(&terrain, 1.0));
        assert_eq!(walker.position, Vec3::new(20.0, 20.0, 0.0));
    }
}
