//! 求解器测试骨架
//!
//! - robotic_arm: 带约束的 CCD + 夹爪中点虚拟末端
//! - test_chain:  可增删关节的 FABRIK 竖直链
//! - biped:       两骨 IK 人形手臂

pub mod biped;
pub mod robotic_arm;
pub mod test_chain;

pub use biped::{Arm, Biped};
pub use robotic_arm::RoboticArm;
pub use test_chain::TestChain;
