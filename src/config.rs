//! 骨骼动画配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 求解器本身只接收显式参数，这里的全局实例只供实体构建时读取默认值。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 骨骼动画配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct RigConfig {
    // ========== IK ==========
    /// IK 最大迭代次数，默认 10
    pub ik_max_iterations: u32,
    /// 末端到目标的收敛阈值（世界单位），默认 0.01
    pub ik_threshold: f32,
    /// 约束 CCD 的死区半径，目标离链根比这更近时不求解，默认 2.1
    pub ccd_dead_zone: f32,

    // ========== 毛发 ==========
    /// 重力 Z 分量（负数向下），默认 -9.8
    pub hair_gravity_z: f32,
    /// Verlet 速度阻尼，默认 0.95
    pub hair_damping: f32,
    /// 长度约束松弛次数，默认 2
    pub hair_constraint_iterations: u32,
    /// 每帧向静止方向回拉的比例，默认 0.004
    pub hair_rest_bias: f32,
    /// 风扰动幅度，默认 0.2
    pub hair_wind_strength: f32,

    // ========== 漫游 ==========
    /// 重新挑选方向的间隔（秒），默认 7.0
    pub roam_change_interval: f32,
    /// 转向插值时长（秒），默认 10.0
    pub roam_turn_duration: f32,

    // ========== 地形 ==========
    /// 构建切线基时的采样偏移，默认 1.0
    pub terrain_probe_offset: f32,
    /// 脚部目标离地高度，默认 0.05
    pub foot_clearance: f32,

    // ========== 调试 ==========
    /// 是否输出求解调试日志，默认 false
    pub debug_log: bool,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            // ====== IK ======
            // 迭代预算是唯一的每帧工作量上限
            ik_max_iterations: 10,
            ik_threshold: 0.01,
            // 机械臂内侧的排除区
            ccd_dead_zone: 2.1,

            // ====== 毛发 ======
            hair_gravity_z: -9.8,
            hair_damping: 0.95,
            hair_constraint_iterations: 2,
            // 过大会让毛发看起来僵硬
            hair_rest_bias: 0.004,
            hair_wind_strength: 0.2,

            // ====== 漫游 ======
            roam_change_interval: 7.0,
            roam_turn_duration: 10.0,

            // ====== 地形 ======
            terrain_probe_offset: 1.0,
            foot_clearance: 0.05,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static RIG_CONFIG: Lazy<RwLock<RigConfig>> = Lazy::new(|| RwLock::new(RigConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> RigConfig {
    RIG_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: RigConfig) {
    *RIG_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *RIG_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = RigConfig::default();
}
