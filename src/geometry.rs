//! 几何输出
//!
//! 姿态更新后由骨骼世界变换生成三角形列表，追加到调用方持有的缓冲区。
//! 缓冲区由调用方每帧清空并上传，核心不持有任何 GPU 资源。

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::skeleton::Skeleton;

/// 默认经线数
pub const DEFAULT_SLICES: u32 = 16;
/// 默认纬线数
pub const DEFAULT_STACKS: u32 = 8;

// ============================================================================
// 顶点格式
// ============================================================================

/// 8 位 RGBA 颜色
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const BROWN: Self = Self::rgb(139, 69, 19);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// 位置 + 颜色 + UV
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: Rgba8,
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, color: Rgba8, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color,
            uv: uv.to_array(),
        }
    }
}

// ============================================================================
// 基本体
// ============================================================================

/// 球（经纬网格，每格两个三角形）
pub fn add_verts_for_sphere(
    verts: &mut Vec<Vertex>,
    center: Vec3,
    radius: f32,
    color: Rgba8,
    slices: u32,
    stacks: u32,
) {
    let slices = slices.max(3);
    let stacks = stacks.max(2);

    let point = |slice: u32, stack: u32| {
        // 纬度从南极 -π/2 到北极 π/2，Z 向上
        let phi = stack as f32 / stacks as f32 * PI - PI * 0.5;
        let theta = slice as f32 / slices as f32 * TAU;
        let direction = Vec3::new(phi.cos() * theta.cos(), phi.cos() * theta.sin(), phi.sin());
        let uv = Vec2::new(slice as f32 / slices as f32, stack as f32 / stacks as f32);
        Vertex::new(center + direction * radius, color, uv)
    };

    verts.reserve((slices * stacks * 6) as usize);
    for stack in 0..stacks {
        for slice in 0..slices {
            let bl = point(slice, stack);
            let br = point(slice + 1, stack);
            let tl = point(slice, stack + 1);
            let tr = point(slice + 1, stack + 1);
            verts.extend_from_slice(&[bl, br, tr, bl, tr, tl]);
        }
    }
}

/// 圆柱（侧面 + 两端封口），起止点重合时不输出
pub fn add_verts_for_cylinder(
    verts: &mut Vec<Vertex>,
    start: Vec3,
    end: Vec3,
    radius: f32,
    color: Rgba8,
    slices: u32,
) {
    let Some(frame) = RingFrame::new(start, end) else {
        return;
    };
    let slices = slices.max(3);

    verts.reserve((slices * 12) as usize);
    for slice in 0..slices {
        let u0 = slice as f32 / slices as f32;
        let u1 = (slice + 1) as f32 / slices as f32;
        let r0 = frame.ring(u0) * radius;
        let r1 = frame.ring(u1) * radius;

        let sb0 = Vertex::new(start + r0, color, Vec2::new(u0, 0.0));
        let sb1 = Vertex::new(start + r1, color, Vec2::new(u1, 0.0));
        let et0 = Vertex::new(end + r0, color, Vec2::new(u0, 1.0));
        let et1 = Vertex::new(end + r1, color, Vec2::new(u1, 1.0));

        // 侧面
        verts.extend_from_slice(&[sb0, sb1, et1, sb0, et1, et0]);

        // 封口
        let start_center = Vertex::new(start, color, Vec2::new(0.5, 0.5));
        let end_center = Vertex::new(end, color, Vec2::new(0.5, 0.5));
        verts.extend_from_slice(&[start_center, sb1, sb0, end_center, et0, et1]);
    }
}

/// 圆锥（底面在 start，尖在 end），起止点重合时不输出
pub fn add_verts_for_cone(
    verts: &mut Vec<Vertex>,
    start: Vec3,
    end: Vec3,
    radius: f32,
    color: Rgba8,
    slices: u32,
) {
    let Some(frame) = RingFrame::new(start, end) else {
        return;
    };
    let slices = slices.max(3);

    verts.reserve((slices * 6) as usize);
    let tip = Vertex::new(end, color, Vec2::new(0.5, 1.0));
    let base_center = Vertex::new(start, color, Vec2::new(0.5, 0.5));
    for slice in 0..slices {
        let u0 = slice as f32 / slices as f32;
        let u1 = (slice + 1) as f32 / slices as f32;
        let b0 = Vertex::new(start + frame.ring(u0) * radius, color, Vec2::new(u0, 0.0));
        let b1 = Vertex::new(start + frame.ring(u1) * radius, color, Vec2::new(u1, 0.0));

        verts.extend_from_slice(&[b0, b1, tip, base_center, b1, b0]);
    }
}

/// 垂直于轴线的圆环基
struct RingFrame {
    i: Vec3,
    j: Vec3,
}

impl RingFrame {
    fn new(start: Vec3, end: Vec3) -> Option<Self> {
        let axis = (end - start).try_normalize()?;
        let i = axis.any_orthonormal_vector();
        let j = axis.cross(i);
        Some(Self { i, j })
    }

    /// u ∈ [0, 1] 对应绕轴一圈
    #[inline]
    fn ring(&self, u: f32) -> Vec3 {
        let angle = u * TAU;
        self.i * angle.cos() + self.j * angle.sin()
    }
}

// ============================================================================
// 骨骼
// ============================================================================

/// 骨骼调试几何的样式
#[derive(Clone, Copy, Debug)]
pub struct SkeletonStyle {
    pub joint_radius: f32,
    pub bone_radius: f32,
    pub joint_color: Rgba8,
    pub bone_color: Rgba8,
}

impl Default for SkeletonStyle {
    fn default() -> Self {
        Self {
            joint_radius: 0.1,
            bone_radius: 0.04,
            joint_color: Rgba8::rgb(255, 200, 0),
            bone_color: Rgba8::WHITE,
        }
    }
}

/// 关节球 + 父子骨段圆柱；不可渲染的骨骼（虚拟末端等）及连向它们的骨段跳过
pub fn add_verts_for_skeleton(verts: &mut Vec<Vertex>, skeleton: &Skeleton, style: &SkeletonStyle) {
    for (index, bone) in skeleton.bones().iter().enumerate() {
        if !bone.is_renderable() {
            continue;
        }

        let position = skeleton.world_position(index);
        add_verts_for_sphere(
            verts,
            position,
            style.joint_radius,
            style.joint_color,
            DEFAULT_SLICES,
            DEFAULT_STACKS,
        );

        if let Some(parent) = bone.parent_id() {
            if skeleton.bone(parent).is_renderable() {
                add_verts_for_cylinder(
                    verts,
                    skeleton.world_position(parent),
                    position,
                    style.bone_radius,
                    style.bone_color,
                    DEFAULT_SLICES,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    #[test]
    fn test_vertex_layout_is_packed() {
        assert_eq!(std::mem::size_of::<Rgba8>(), 4);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);

        let verts = [Vertex::new(Vec3::ONE, Rgba8::WHITE, Vec2::ZERO)];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[12..16], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_primitive_vertex_counts() {
        let mut verts = Vec::new();
        add_verts_for_sphere(&mut verts, Vec3::ZERO, 1.0, Rgba8::WHITE, 8, 4);
        assert_eq!(verts.len(), 8 * 4 * 6);

        verts.clear();
        add_verts_for_cylinder(&mut verts, Vec3::ZERO, Vec3::Z, 0.5, Rgba8::WHITE, 8);
        assert_eq!(verts.len(), 8 * 12);

        verts.clear();
        add_verts_for_cone(&mut verts, Vec3::ZERO, Vec3::Z, 0.5, Rgba8::WHITE, 8);
        assert_eq!(verts.len(), 8 * 6);
    }

    #[test]
    fn test_sphere_points_on_surface() {
        let mut verts = Vec::new();
        let center = Vec3::new(1.0, 2.0, 3.0);
        add_verts_for_sphere(&mut verts, center, 0.5, Rgba8::BLACK, 12, 6);
        for v in &verts {
            let d = Vec3::from_array(v.position).distance(center);
            assert!((d - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_segment_emits_nothing() {
        let mut verts = Vec::new();
        add_verts_for_cylinder(&mut verts, Vec3::ONE, Vec3::ONE, 0.5, Rgba8::WHITE, 8);
        add_verts_for_cone(&mut verts, Vec3::ONE, Vec3::ONE, 0.5, Rgba8::WHITE, 8);
        assert!(verts.is_empty());
    }

    #[test]
    fn test_skeleton_skips_non_renderable_bones() {
        let mut skeleton = Skeleton::from_bones([
            Bone::new("root"),
            Bone::child_of("a", 0, Vec3::Z),
            Bone::child_of("b", 1, Vec3::Z),
            Bone::new("midpoint"),
        ])
        .unwrap();
        skeleton.bone_mut(3).set_renderable(false);

        let mut verts = Vec::new();
        add_verts_for_skeleton(&mut verts, &skeleton, &SkeletonStyle::default());

        let sphere = (DEFAULT_SLICES * DEFAULT_STACKS * 6) as usize;
        let cylinder = (DEFAULT_SLICES * 12) as usize;
        assert_eq!(verts.len(), 3 * sphere + 2 * cylinder);
    }
}
