//! 两骨解析 IK
//!
//! root → mid → end 三个关节构成三角形，用余弦定理求中间关节的弯曲角，
//! 再整体摆动根关节让末端对准目标。弯曲平面取当前肢体所在平面，
//! 肢体伸直时退化为 (根, 末端, 目标) 平面。

use glam::{Quat, Vec3};

use super::{direction, rotation_axis};
use crate::skeleton::Skeleton;

/// 让 `end` 尽量落在 `target` 上，只改 `root` 与 `mid` 的本地旋转
///
/// 目标超出 la + lb 时完全伸直并指向目标；目标与根重合时折叠。
/// 内部会刷新受影响的子树，调用方之后仍应执行一次姿态更新。
pub fn solve_two_bone(skeleton: &mut Skeleton, root: usize, mid: usize, end: usize, target: Vec3) {
    let a = skeleton.world_position(root);
    let b = skeleton.world_position(mid);
    let c = skeleton.world_position(end);

    let la = a.distance(b);
    let lb = b.distance(c);
    if la * la < super::DIRECTION_EPSILON || lb * lb < super::DIRECTION_EPSILON {
        return;
    }

    // ========== 中间关节弯曲 ==========
    let d = a.distance(target);
    let cos_desired = ((la * la + lb * lb - d * d) / (2.0 * la * lb)).clamp(-1.0, 1.0);
    let desired = cos_desired.acos();

    let to_root = a - b;
    let to_end = c - b;
    let cos_current = (to_root.dot(to_end) / (la * lb)).clamp(-1.0, 1.0);
    let current = cos_current.acos();

    let axis = bend_axis(to_root, to_end, c - a, target - a);
    let bend = desired - current;
    if bend.abs() > f32::EPSILON {
        skeleton.rotate_bone_in_world(mid, Quat::from_axis_angle(axis, bend));
        skeleton.update_subtree(mid);
    }

    // ========== 根关节摆动 ==========
    let c = skeleton.world_position(end);
    if let (Some(from), Some(to)) = (direction(c - a), direction(target - a)) {
        skeleton.rotate_bone_in_world(root, Quat::from_rotation_arc(from, to));
        skeleton.update_subtree(root);
    }
}

/// 弯曲轴：优先当前肢体平面法线，其次 (根→末端, 根→目标) 平面法线
fn bend_axis(to_root: Vec3, to_end: Vec3, root_to_end: Vec3, root_to_target: Vec3) -> Vec3 {
    if let Some(axis) = rotation_axis(to_root, to_end) {
        return axis;
    }
    // 伸直或折叠
    if let Some(axis) = rotation_axis(root_to_target, root_to_end) {
        return axis;
    }
    match direction(root_to_end) {
        Some(limb) => limb.any_orthonormal_vector(),
        None => Vec3::X,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    const EPS: f32 = 1e-3;

    /// 根在原点，la = 2，lb = 1.5，伸直朝 +Z
    fn limb() -> Skeleton {
        Skeleton::from_bones([
            Bone::new("root"),
            Bone::child_of("mid", 0, Vec3::new(0.0, 0.0, 2.0)),
            Bone::child_of("end", 1, Vec3::new(0.0, 0.0, 1.5)),
        ])
        .unwrap()
    }

    fn solve(target: Vec3) -> Skeleton {
        let mut skeleton = limb();
        solve_two_bone(&mut skeleton, 0, 1, 2, target);
        skeleton.update_pose();
        skeleton
    }

    #[test]
    fn test_reachable_targets_are_hit() {
        let targets = [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 0.0, -1.0),
            Vec3::new(-0.5, 2.5, 1.5),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.3, -0.2, 0.4),
        ];
        for target in targets {
            let skeleton = solve(target);
            let end = skeleton.world_position(2);
            assert!(
                end.distance(target) < EPS,
                "target {:?} end {:?}",
                target,
                end
            );
        }
    }

    #[test]
    fn test_segment_lengths_are_kept() {
        let skeleton = solve(Vec3::new(1.0, -1.0, 0.5));
        let a = skeleton.world_position(0);
        let b = skeleton.world_position(1);
        let c = skeleton.world_position(2);
        assert!((a.distance(b) - 2.0).abs() < EPS);
        assert!((b.distance(c) - 1.5).abs() < EPS);
    }

    #[test]
    fn test_unreachable_fully_extends() {
        let target = Vec3::new(10.0, 0.0, 0.0);
        let skeleton = solve(target);
        let end = skeleton.world_position(2);
        assert!((end - Vec3::new(3.5, 0.0, 0.0)).length() < EPS);

        // 中间关节也在直线上
        let mid = skeleton.world_position(1);
        assert!((mid - Vec3::new(2.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_target_at_root_produces_no_nan() {
        let skeleton = solve(Vec3::ZERO);
        for bone in skeleton.bones() {
            assert!(bone.local_rotation.is_finite());
            assert!(bone.local_to_world.is_finite());
        }
        // 无法到达原点时折叠到 |la - lb|
        let end = skeleton.world_position(2);
        assert!((end.length() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_bent_limb_keeps_its_plane() {
        let mut skeleton = limb();
        // 预先在 XZ 平面内弯曲
        skeleton.set_local_rotation(1, Quat::from_rotation_y(0.5));
        skeleton.update_pose();

        let target = Vec3::new(1.0, 0.0, 2.0);
        solve_two_bone(&mut skeleton, 0, 1, 2, target);
        skeleton.update_pose();

        assert!(skeleton.world_position(2).distance(target) < EPS);
        assert!(skeleton.world_position(1).y.abs() < EPS);
    }
}
