//! 程序化动画片段

use glam::Vec3;

use crate::skeleton::Skeleton;

/// 姿态函数：根据片段时间直接写骨骼本地状态
pub type PoseFn = fn(&mut Skeleton, &RestPose, f32);

/// 静止姿态快照
///
/// 程序化片段以静止姿态为基准叠加偏移，避免逐帧累积误差。
#[derive(Clone, Debug, Default)]
pub struct RestPose {
    /// 各骨骼的静止本地位置
    pub positions: Vec<Vec3>,
    /// 各骨骼相对父骨骼的方向（本地位置差），根骨骼取 +X
    pub directions: Vec<Vec3>,
}

impl RestPose {
    pub fn capture(skeleton: &Skeleton) -> Self {
        let positions: Vec<Vec3> = skeleton.bones().iter().map(|b| b.local_position).collect();
        let directions = skeleton
            .bones()
            .iter()
            .map(|bone| match bone.parent_id() {
                Some(parent) => {
                    let delta = bone.local_position - positions[parent];
                    delta.try_normalize().unwrap_or(delta)
                }
                None => Vec3::X,
            })
            .collect();
        Self { positions, directions }
    }

    /// 全部骨骼回到静止位置
    pub fn restore_positions(&self, skeleton: &mut Skeleton) {
        for (index, &position) in self.positions.iter().enumerate() {
            skeleton.set_local_position(index, position);
        }
    }
}

/// 沿静止方向的行波：offset_i = dir_i * sin(time * speed + i * phase) * amplitude
pub fn wave_along_rest(
    skeleton: &mut Skeleton,
    rest: &RestPose,
    time: f32,
    speed: f32,
    phase: f32,
    amplitude: f32,
) {
    for (index, (&base, &direction)) in rest.positions.iter().zip(&rest.directions).enumerate() {
        let wave = (time * speed + index as f32 * phase).sin() * amplitude;
        skeleton.set_local_position(index, base + direction * wave);
    }
}

/// 动画片段
#[derive(Clone, Debug)]
pub struct AnimClip {
    pub name: String,
    /// 时长（秒）
    pub duration: f32,
    /// 循环片段回绕时间，非循环片段停在末尾
    pub looping: bool,
    pub pose: PoseFn,
}

impl AnimClip {
    pub fn new(name: impl Into<String>, duration: f32, looping: bool, pose: PoseFn) -> Self {
        Self {
            name: name.into(),
            duration,
            looping,
            pose,
        }
    }

    /// 把累计时间映射到片段时间
    pub fn sample_time(&self, time: f32) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        if self.looping {
            time.rem_euclid(self.duration)
        } else {
            time.clamp(0.0, self.duration)
        }
    }

    #[inline]
    pub fn is_finished(&self, time: f32) -> bool {
        !self.looping && time >= self.duration
    }

    /// 在给定累计时间上应用片段
    pub fn apply(&self, skeleton: &mut Skeleton, rest: &RestPose, time: f32) {
        (self.pose)(skeleton, rest, self.sample_time(time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    fn zigzag() -> Skeleton {
        Skeleton::from_bones([
            Bone::new("a"),
            Bone::child_of("b", 0, Vec3::new(1.0, 0.0, 0.0)),
            Bone::child_of("c", 1, Vec3::new(1.0, 1.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_rest_pose_directions() {
        let rest = RestPose::capture(&zigzag());
        assert_eq!(rest.directions[0], Vec3::X);
        // b 相对 a 的本地位置差
        assert_eq!(rest.directions[1], Vec3::X);
        // c 的本地位置 (1,1,0) 减去 b 的本地位置 (1,0,0)
        assert_eq!(rest.directions[2], Vec3::Y);
    }

    #[test]
    fn test_sample_time() {
        fn noop(_: &mut Skeleton, _: &RestPose, _: f32) {}
        let once = AnimClip::new("once", 2.0, false, noop);
        let looped = AnimClip::new("loop", 2.0, true, noop);

        assert_eq!(once.sample_time(3.5), 2.0);
        assert!(once.is_finished(2.0));
        assert!((looped.sample_time(3.5) - 1.5).abs() < 1e-6);
        assert!(!looped.is_finished(10.0));
    }

    #[test]
    fn test_wave_offsets_from_rest() {
        let mut skeleton = zigzag();
        let rest = RestPose::capture(&skeleton);

        // t = 0 时第 0 根骨骼偏移 sin(0) = 0，第 1 根 sin(π/2) = 1
        wave_along_rest(&mut skeleton, &rest, 0.0, 1.0, std::f32::consts::FRAC_PI_2, 0.5);
        assert!((skeleton.bone(0).local_position - Vec3::ZERO).length() < 1e-6);
        assert!((skeleton.bone(1).local_position - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-6);

        rest.restore_positions(&mut skeleton);
        assert_eq!(skeleton.bone(1).local_position, Vec3::new(1.0, 0.0, 0.0));
    }
}
