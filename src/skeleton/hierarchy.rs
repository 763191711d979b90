//! 骨骼层次与姿态更新
//!
//! 骨骼按数组顺序存放，父骨骼总在子骨骼之前（拓扑序），
//! 所以姿态更新只需一次顺序遍历。

use glam::{Mat4, Quat, Vec3};

use super::bone::{Bone, BoneFlags};
use super::{rotation_of, translation_of};
use crate::{Result, RigError};

/// 骨骼
///
/// 每个实体独占一个 Skeleton。`model_transform` 把整套骨骼放到世界中
/// （实体位置 + 地形朝向）。
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// 模型变换（根骨骼的父空间）
    pub model_transform: Mat4,
}

impl Skeleton {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            model_transform: Mat4::IDENTITY,
        }
    }

    /// 由按拓扑序排列的骨骼构建，并计算一次姿态
    pub fn from_bones(bones: impl IntoIterator<Item = Bone>) -> Result<Self> {
        let mut skeleton = Self::new();
        for bone in bones {
            skeleton.push_bone(bone)?;
        }
        skeleton.update_pose();
        Ok(skeleton)
    }

    // ========================================
    // 结构编辑
    // ========================================

    /// 在尾部追加骨骼，修补父骨骼的子列表，返回新索引
    ///
    /// 父索引必须指向已存在的骨骼。追加后调用方需要重新计算姿态。
    pub fn push_bone(&mut self, mut bone: Bone) -> Result<usize> {
        let index = self.bones.len();
        if let Some(parent) = bone.parent_id() {
            if parent >= index {
                return Err(RigError::InvalidParent {
                    bone: bone.name,
                    parent: bone.parent_index,
                });
            }
            self.bones[parent].children.push(index);
        }
        bone.children.clear();
        self.bones.push(bone);
        Ok(index)
    }

    /// 移除尾部骨骼并从父骨骼的子列表中摘除
    ///
    /// 引用该骨骼的 IK 链由调用方负责重建。
    pub fn pop_bone(&mut self) -> Option<Bone> {
        let bone = self.bones.pop()?;
        let index = self.bones.len();
        if let Some(parent) = bone.parent_id() {
            self.bones[parent].children.retain(|&child| child != index);
        }
        Some(bone)
    }

    // ========================================
    // 姿态更新
    // ========================================

    /// 按数组顺序把本地变换传播到世界变换
    ///
    /// 根骨骼: world = model_transform * local
    /// 其他:   world = parent.world * local
    /// 带 WORLD_PINNED 的骨骼保持外部写入的世界变换。
    pub fn update_pose(&mut self) {
        for i in 0..self.bones.len() {
            self.compose_world(i);
        }
    }

    /// 只刷新 `index` 及其后代（沿子列表递归）
    pub fn update_subtree(&mut self, index: usize) {
        if index >= self.bones.len() {
            return;
        }

        self.compose_world(index);

        // 子列表在递归中不会变化，逐个按下标取，避免克隆
        for k in 0..self.bones[index].children.len() {
            let child = self.bones[index].children[k];
            self.update_subtree(child);
        }
    }

    #[inline]
    fn compose_world(&mut self, index: usize) {
        let bone = &self.bones[index];
        if bone.is_world_pinned() {
            return;
        }
        let parent_world = match bone.parent_id() {
            Some(parent) => self.bones[parent].local_to_world,
            None => self.model_transform,
        };
        let world = parent_world * bone.local_transform();
        self.bones[index].local_to_world = world;
    }

    // ========================================
    // 查找
    // ========================================

    /// 按名称线性查找
    pub fn bone_index_by_name(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// 按名称查找，找不到视为骨骼搭建错误
    pub fn require_bone(&self, name: &str) -> Result<usize> {
        self.bone_index_by_name(name).ok_or_else(|| {
            log::warn!("骨骼不存在: {}", name);
            RigError::BoneNotFound(name.to_string())
        })
    }

    // ========================================
    // 世界空间查询（要求姿态已是最新）
    // ========================================

    #[inline]
    pub fn world_position(&self, index: usize) -> Vec3 {
        translation_of(&self.bones[index].local_to_world)
    }

    #[inline]
    pub fn world_rotation(&self, index: usize) -> Quat {
        rotation_of(&self.bones[index].local_to_world)
    }

    /// 父骨骼的世界旋转；根骨骼返回模型变换的旋转
    #[inline]
    pub fn parent_world_rotation(&self, index: usize) -> Quat {
        match self.bones[index].parent_id() {
            Some(parent) => rotation_of(&self.bones[parent].local_to_world),
            None => rotation_of(&self.model_transform),
        }
    }

    /// 把世界空间的增量旋转换算到本地后左乘
    ///
    /// local' = inverse(parentWorld) * delta * world
    pub fn rotate_bone_in_world(&mut self, index: usize, delta: Quat) {
        let parent_rotation = self.parent_world_rotation(index);
        let world_rotation = self.world_rotation(index);
        let local = parent_rotation.inverse() * delta * world_rotation;
        self.bones[index].set_local_rotation(local);
    }

    /// 直接指定世界旋转：local = inverse(parentWorld) * world
    pub fn set_world_rotation(&mut self, index: usize, world_rotation: Quat) {
        let parent_rotation = self.parent_world_rotation(index);
        self.bones[index].set_local_rotation(parent_rotation.inverse() * world_rotation);
    }

    /// 把骨骼钉在给定世界位置，姿态更新不再覆盖它
    pub fn pin_world_position(&mut self, index: usize, position: Vec3) {
        let bone = &mut self.bones[index];
        bone.flags.insert(BoneFlags::WORLD_PINNED);
        bone.local_to_world = Mat4::from_translation(position);
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    pub fn bone(&self, index: usize) -> &Bone {
        &self.bones[index]
    }

    #[inline]
    pub fn bone_mut(&mut self, index: usize) -> &mut Bone {
        &mut self.bones[index]
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn set_local_rotation(&mut self, index: usize, rotation: Quat) {
        self.bones[index].set_local_rotation(rotation);
    }

    #[inline]
    pub fn set_local_position(&mut self, index: usize, position: Vec3) {
        self.bones[index].set_local_position(position);
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}
