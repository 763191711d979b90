//! 旋转约束
//!
//! 逐欧拉轴（偏航 yaw / 俯仰 pitch / 翻滚 roll）的 自由 / 限制 / 锁定。
//! 世界坐标约定 Z 向上、X 向前：yaw 绕 Z，pitch 绕 Y，roll 绕 X，
//! 合成顺序 R = Rz(yaw) * Ry(pitch) * Rx(roll)。

use glam::{EulerRot, Quat};

/// 单轴约束
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum AxisConstraint {
    /// 不限制
    #[default]
    Free,
    /// 限制在 [min, max] 度
    Limited { min_degrees: f32, max_degrees: f32 },
    /// 该轴清零
    Locked,
}

impl AxisConstraint {
    /// 限制到区间
    pub fn limited(min_degrees: f32, max_degrees: f32) -> Self {
        AxisConstraint::Limited {
            min_degrees: min_degrees.min(max_degrees),
            max_degrees: min_degrees.max(max_degrees),
        }
    }

    /// 对一个角度（度）应用约束
    #[inline]
    pub fn clamp_degrees(&self, degrees: f32) -> f32 {
        match *self {
            AxisConstraint::Free => degrees,
            AxisConstraint::Limited { min_degrees, max_degrees } => {
                degrees.clamp(min_degrees, max_degrees)
            }
            AxisConstraint::Locked => 0.0,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, AxisConstraint::Free)
    }
}

/// 骨骼旋转约束
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct RotationConstraint {
    pub yaw: AxisConstraint,
    pub pitch: AxisConstraint,
    pub roll: AxisConstraint,
}

impl RotationConstraint {
    pub const FREE: Self = Self {
        yaw: AxisConstraint::Free,
        pitch: AxisConstraint::Free,
        roll: AxisConstraint::Free,
    };

    pub fn new(yaw: AxisConstraint, pitch: AxisConstraint, roll: AxisConstraint) -> Self {
        Self { yaw, pitch, roll }
    }

    /// 三轴都自由
    #[inline]
    pub fn is_free(&self) -> bool {
        self.yaw.is_free() && self.pitch.is_free() && self.roll.is_free()
    }

    /// 把候选旋转分解为欧拉角、逐轴限制后重新合成
    ///
    /// 全自由时原样返回，不经过欧拉分解。
    pub fn apply(&self, rotation: Quat) -> Quat {
        if self.is_free() {
            return rotation;
        }

        let (yaw, pitch, roll) = Self::to_euler_degrees(rotation);
        let yaw = self.yaw.clamp_degrees(yaw);
        let pitch = self.pitch.clamp_degrees(pitch);
        let roll = self.roll.clamp_degrees(roll);

        Self::from_euler_degrees(yaw, pitch, roll)
    }

    /// 分解为 (yaw, pitch, roll) 度
    #[inline]
    pub fn to_euler_degrees(rotation: Quat) -> (f32, f32, f32) {
        let (yaw, pitch, roll) = rotation.normalize().to_euler(EulerRot::ZYX);
        (yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees())
    }

    /// 由 (yaw, pitch, roll) 度合成
    #[inline]
    pub fn from_euler_degrees(yaw: f32, pitch: f32, roll: f32) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            yaw.to_radians(),
            pitch.to_radians(),
            roll.to_radians(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_limited_axis_clamps_to_bound() {
        let constraint = RotationConstraint::new(
            AxisConstraint::limited(-45.0, 45.0),
            AxisConstraint::Free,
            AxisConstraint::Free,
        );
        let candidate = RotationConstraint::from_euler_degrees(90.0, 0.0, 0.0);
        let (yaw, pitch, roll) = RotationConstraint::to_euler_degrees(constraint.apply(candidate));
        assert!((yaw - 45.0).abs() < EPS);
        assert!(pitch.abs() < EPS);
        assert!(roll.abs() < EPS);

        let candidate = RotationConstraint::from_euler_degrees(-90.0, 0.0, 0.0);
        let (yaw, _, _) = RotationConstraint::to_euler_degrees(constraint.apply(candidate));
        assert!((yaw + 45.0).abs() < EPS);
    }

    #[test]
    fn test_limited_roll_clamps_to_bound() {
        let constraint = RotationConstraint::new(
            AxisConstraint::Free,
            AxisConstraint::Free,
            AxisConstraint::limited(-45.0, 45.0),
        );
        let candidate = RotationConstraint::from_euler_degrees(0.0, 0.0, 90.0);
        let (_, _, roll) = RotationConstraint::to_euler_degrees(constraint.apply(candidate));
        assert!((roll - 45.0).abs() < EPS);
    }

    #[test]
    fn test_locked_axis_is_zeroed() {
        let constraint = RotationConstraint::new(
            AxisConstraint::Free,
            AxisConstraint::Locked,
            AxisConstraint::Free,
        );
        let candidate = RotationConstraint::from_euler_degrees(30.0, 60.0, -20.0);
        let (yaw, pitch, roll) = RotationConstraint::to_euler_degrees(constraint.apply(candidate));
        assert!(pitch.abs() < EPS);
        // 自由轴保持输入
        assert!((yaw - 30.0).abs() < EPS);
        assert!((roll + 20.0).abs() < EPS);
    }

    #[test]
    fn test_free_passes_through_unchanged() {
        let candidate = RotationConstraint::from_euler_degrees(120.0, -30.0, 75.0);
        let result = RotationConstraint::FREE.apply(candidate);
        assert_eq!(result, candidate);
    }

    #[test]
    fn test_within_limits_is_untouched() {
        let constraint = RotationConstraint::new(
            AxisConstraint::limited(-45.0, 45.0),
            AxisConstraint::limited(-45.0, 45.0),
            AxisConstraint::Locked,
        );
        let candidate = RotationConstraint::from_euler_degrees(10.0, -20.0, 0.0);
        let result = constraint.apply(candidate);
        assert!(result.dot(candidate).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_limited_normalizes_bounds() {
        assert_eq!(
            AxisConstraint::limited(30.0, -30.0),
            AxisConstraint::Limited { min_degrees: -30.0, max_degrees: 30.0 }
        );
    }
}
