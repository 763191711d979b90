//! 骨骼节点
//!
//! Bone 是骨骼系统的核心单元。每个 Bone 代表骨骼层次中的一个节点，
//! 本地变换是作者编辑的量，世界变换只由姿态更新推导。

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use super::constraint::RotationConstraint;
use super::{rotation_of, translation_of};

// ============================================================================
// 骨骼标志
// ============================================================================

bitflags! {
    /// 骨骼标志位
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BoneFlags: u32 {
        /// 参与几何输出（关节球 + 骨段圆柱）
        const RENDERABLE = 1 << 0;
        /// 世界变换由外部直接写入，姿态更新时保持不变（虚拟末端等）
        const WORLD_PINNED = 1 << 1;
    }
}

impl Default for BoneFlags {
    fn default() -> Self {
        BoneFlags::RENDERABLE
    }
}

// ============================================================================
// 骨骼节点
// ============================================================================

/// 骨骼节点
///
/// - 静态数据：名称、父子关系、约束、标志
/// - 动态数据：本地位置/旋转（每帧编辑）与世界变换（姿态更新写入）
/// - 变换计算：local_to_world = parent.local_to_world * T(local_position) * R(local_rotation)
#[derive(Clone, Debug)]
pub struct Bone {
    /// 骨骼名称（按名查找用）
    pub name: String,

    /// 父骨骼索引 (-1 表示根骨骼)
    pub parent_index: i32,

    /// 子骨骼索引
    pub children: Vec<usize>,

    /// 相对父骨骼的位置
    pub local_position: Vec3,

    /// 相对父骨骼的旋转（单位四元数）
    pub local_rotation: Quat,

    /// 世界变换（姿态更新推导）
    pub local_to_world: Mat4,

    /// 旋转约束
    pub constraint: RotationConstraint,

    /// 骨骼标志
    pub flags: BoneFlags,
}

impl Bone {
    /// 创建新的根骨骼
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_index: -1,
            children: Vec::new(),
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            local_to_world: Mat4::IDENTITY,
            constraint: RotationConstraint::default(),
            flags: BoneFlags::default(),
        }
    }

    /// 创建挂在 `parent` 下、位于 `local_position` 的骨骼
    pub fn child_of(name: impl Into<String>, parent: usize, local_position: Vec3) -> Self {
        let mut bone = Self::new(name);
        bone.parent_index = parent as i32;
        bone.local_position = local_position;
        bone
    }

    /// 设置旋转约束
    pub fn with_constraint(mut self, constraint: RotationConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    // ========================================
    // 访问器
    // ========================================

    /// 父骨骼索引
    #[inline]
    pub fn parent_id(&self) -> Option<usize> {
        if self.parent_index >= 0 {
            Some(self.parent_index as usize)
        } else {
            None
        }
    }

    /// 是否为根骨骼
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }

    /// 获取世界位置
    #[inline]
    pub fn position(&self) -> Vec3 {
        translation_of(&self.local_to_world)
    }

    /// 获取世界旋转
    #[inline]
    pub fn rotation(&self) -> Quat {
        rotation_of(&self.local_to_world)
    }

    /// 本地变换矩阵 (local_to_parent)，先旋转后平移
    #[inline]
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.local_rotation, self.local_position)
    }

    // ========================================
    // 本地状态编辑
    // ========================================

    #[inline]
    pub fn set_local_position(&mut self, position: Vec3) {
        self.local_position = position;
    }

    #[inline]
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.local_rotation = rotation.normalize();
    }

    /// 经过约束后再写入本地旋转
    #[inline]
    pub fn set_constrained_rotation(&mut self, rotation: Quat) {
        self.local_rotation = self.constraint.apply(rotation).normalize();
    }

    // ========================================
    // 标志检查方法
    // ========================================

    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.flags.contains(BoneFlags::RENDERABLE)
    }

    #[inline]
    pub fn set_renderable(&mut self, renderable: bool) {
        self.flags.set(BoneFlags::RENDERABLE, renderable);
    }

    #[inline]
    pub fn is_world_pinned(&self) -> bool {
        self.flags.contains(BoneFlags::WORLD_PINNED)
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_transform_rotates_then_translates() {
        let mut bone = Bone::new("b");
        bone.local_position = Vec3::new(1.0, 0.0, 0.0);
        bone.set_local_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));

        let m = bone.local_transform();
        // 平移不受自身旋转影响
        assert!((m.transform_point3(Vec3::ZERO) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        // 子空间 X 轴被旋到 Y
        assert!((m.transform_vector3(Vec3::X) - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_flags() {
        let mut bone = Bone::child_of("mid", 0, Vec3::Z);
        assert!(bone.is_renderable());
        assert!(!bone.is_root());
        assert_eq!(bone.parent_id(), Some(0));

        bone.set_renderable(false);
        assert!(!bone.is_renderable());
    }
}
