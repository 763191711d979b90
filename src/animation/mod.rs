//! 动画系统
//!
//! 程序化动画片段 + 显式状态机：
//! - clip: 片段是 (姿态函数, 时长, 是否循环) 的纯数据
//! - state_machine: 命名状态与命名触发器

mod clip;
mod state_machine;

pub use clip::{wave_along_rest, AnimClip, PoseFn, RestPose};
pub use state_machine::AnimStateMachine;
