//! 动画状态机
//!
//! 状态是命名的动画片段，转移由 (源状态, 触发器名) 唯一确定目标状态。
//! 切换状态时片段时间归零。

use super::clip::{AnimClip, RestPose};
use crate::skeleton::Skeleton;
use crate::{Result, RigError};

#[derive(Clone, Debug)]
struct Transition {
    from: usize,
    trigger: String,
    to: usize,
}

/// 动画状态机
#[derive(Clone, Debug, Default)]
pub struct AnimStateMachine {
    states: Vec<AnimClip>,
    transitions: Vec<Transition>,
    current: Option<usize>,
    time: f32,
}

impl AnimStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册状态，同名状态会被替换
    pub fn add_state(&mut self, clip: AnimClip) -> usize {
        if let Some(index) = self.state_index(&clip.name) {
            self.states[index] = clip;
            return index;
        }
        self.states.push(clip);
        self.states.len() - 1
    }

    /// 注册转移：处于 `from` 时收到 `trigger` 进入 `to`
    pub fn add_transition(&mut self, from: &str, trigger: &str, to: &str) -> Result<()> {
        let from = self.require_state(from)?;
        let to = self.require_state(to)?;
        self.transitions.retain(|t| !(t.from == from && t.trigger == trigger));
        self.transitions.push(Transition {
            from,
            trigger: trigger.to_string(),
            to,
        });
        Ok(())
    }

    /// 直接切换到指定状态
    pub fn set_state(&mut self, name: &str) -> Result<()> {
        let index = self.require_state(name)?;
        self.enter(index);
        Ok(())
    }

    /// 发送触发器；当前状态没有对应转移时忽略，返回是否发生了切换
    pub fn trigger(&mut self, trigger: &str) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let target = self
            .transitions
            .iter()
            .find(|t| t.from == current && t.trigger == trigger)
            .map(|t| t.to);

        match target {
            Some(to) => {
                log::debug!(
                    "动画状态切换: {} --{}--> {}",
                    self.states[current].name,
                    trigger,
                    self.states[to].name
                );
                self.enter(to);
                true
            }
            None => false,
        }
    }

    /// 推进时间并把当前片段写入骨骼；调用方之后需要更新姿态
    pub fn update(&mut self, skeleton: &mut Skeleton, rest: &RestPose, dt: f32) {
        let Some(current) = self.current else {
            return;
        };
        self.time += dt;
        self.states[current].apply(skeleton, rest, self.time);
    }

    /// 当前状态名
    pub fn current_state(&self) -> Option<&str> {
        self.current.map(|i| self.states[i].name.as_str())
    }

    /// 当前状态已播放的时间
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    fn enter(&mut self, index: usize) {
        self.current = Some(index);
        self.time = 0.0;
    }

    fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    fn require_state(&self, name: &str) -> Result<usize> {
        self.state_index(name)
            .ok_or_else(|| RigError::UnknownState(name.to_string()))
    }
}
