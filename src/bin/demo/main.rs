//! 无窗口演示
//!
//! 在丘陵地形上生成全部生物与测试骨架，按固定步长推进若干帧，
//! 输出每个骨架的统计信息。不做任何渲染。

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rig_engine::{
    get_config, Biped, Creature, FrameContext, HeightField, RoboticArm, TerrainQuery, TestChain, Vertex,
};

const TERRAIN_SIZE: usize = 100;
const FRAMES: u32 = 600;
const DT: f32 = 1.0 / 60.0;
/// 机械臂目标移动速度（单位/秒）
const ARM_TARGET_SPEED: f32 = 2.0;

fn spawn_point(terrain: &HeightField, x: f32, y: f32) -> Vec3 {
    Vec3::new(x, y, terrain.height_at(x, y))
}

fn main() -> rig_engine::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = get_config();
    let terrain = HeightField::hills(TERRAIN_SIZE, 1.0, false);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    // ========== 生物 ==========
    let mut creatures = Vec::new();
    creatures.push(Creature::snake(&config, spawn_point(&terrain, 25.0, 25.0))?);

    let mut idle_snake = Creature::snake(&config, spawn_point(&terrain, 0.0, -10.0))?;
    idle_snake.set_stationary(true);
    creatures.push(idle_snake);

    creatures.push(Creature::spider(&config, spawn_point(&terrain, 85.0, 30.0), &mut rng)?);

    let mut runner = Creature::spider(&config, spawn_point(&terrain, 50.0, 50.0), &mut rng)?;
    runner.set_speed(3.5);
    runner.set_roaming(true);
    runner.set_leg_ik(true);
    creatures.push(runner);

    let mut idle_spider = Creature::spider(&config, spawn_point(&terrain, 0.0, -15.0), &mut rng)?;
    idle_spider.set_stationary(true);
    creatures.push(idle_spider);

    creatures.push(Creature::octopus(&config, spawn_point(&terrain, 40.0, 45.0))?);

    let mut idle_octopus = Creature::octopus(&config, spawn_point(&terrain, 0.0, -5.0))?;
    idle_octopus.set_stationary(true);
    creatures.push(idle_octopus);

    // ========== 测试骨架 ==========
    let mut arm = RoboticArm::new(&config)?;
    let mut chain = TestChain::new(&config, rig_engine::rigs::test_chain::DEFAULT_SEGMENTS)?;
    let mut biped = Biped::new(&config)?;
    chain.add_joint()?;

    let mut verts: Vec<Vertex> = Vec::new();
    let mut arm_converged = 0u32;

    for frame in 0..FRAMES {
        let elapsed = frame as f32 * DT;
        let mut ctx = FrameContext {
            terrain: &terrain,
            rng: &mut rng,
            elapsed,
        };
        for creature in &mut creatures {
            creature.update(&mut ctx, DT);
        }

        // 机械臂目标绕圈移动，中途切换一次约束模式
        let heading = Vec3::new(elapsed.cos(), elapsed.sin(), -0.3);
        arm.move_target(heading * ARM_TARGET_SPEED * DT);
        if frame == FRAMES / 2 {
            arm.toggle_constraints();
            biped.toggle_arm();
            biped.free_animate = true;
        }
        let report = arm.update();
        if report.distance < config.ik_threshold {
            arm_converged += 1;
        }

        chain.update(DT);
        biped.update(DT);

        verts.clear();
        for creature in &creatures {
            creature.emit_geometry(&mut verts);
        }
        arm.emit_geometry(&mut verts);
        chain.emit_geometry(&mut verts);
        biped.emit_geometry(&mut verts);
    }

    for creature in &creatures {
        let position = creature.position();
        log::info!(
            "{:<8} 骨骼 {:>3}  位置 ({:>6.2}, {:>6.2}, {:>5.2})  静止 {}",
            creature.name(),
            creature.skeleton().len(),
            position.x,
            position.y,
            position.z,
            creature.locomotion().stationary
        );
    }
    log::info!(
        "机械臂: 目标 {:?}, 末端 {:?}, 收敛帧 {}/{}",
        arm.target(),
        arm.effector_position(),
        arm_converged,
        FRAMES
    );
    log::info!("FABRIK 链: {} 个关节, 末端 {:?}", chain.skeleton.len(), chain.end_position());
    log::info!("两骨人形: {:?} 手在 {:?}", biped.arm, biped.hand_position());
    log::info!("最后一帧顶点数: {}", verts.len());

    Ok(())
}
