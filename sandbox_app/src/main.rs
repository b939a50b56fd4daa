//! Sandbox demo application
//!
//! Builds a small scene headlessly: a spinning cube, a static ground slab,
//! and a crate that falls onto it, logging the collision events as they
//! arrive. Demonstrates type registration, behaviors, and the fixed-step
//! frame loop without a rendering backend.

use ember_engine::prelude::*;

/// Spins its object around the Y axis
struct Spinner {
    speed: f32,
}

impl ObjectBehavior for Spinner {
    fn on_update(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {
        if let Some(transform) = ctx.transform_mut() {
            transform.rotate_axis(&Vec3::new(0.0, 1.0, 0.0), self.speed * dt);
        }
    }
}

/// Logs its collision lifecycle and despawns shortly after landing
struct FallingCrate {
    landed_for: f32,
}

impl ObjectBehavior for FallingCrate {
    fn on_start(&mut self, _ctx: &mut ObjectContext<'_>) {
        log::info!("crate released");
    }

    fn on_collision_enter(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {
        let other_name = ctx
            .owner_of(other)
            .and_then(|key| ctx.scene.object(key).map(|o| o.name().to_string()))
            .unwrap_or_else(|| "<unknown>".to_string());
        log::info!("crate touched down on {other_name:?}");
    }

    fn on_fixed_update(&mut self, ctx: &mut ObjectContext<'_>, fixed_dt: f32) {
        let resting = ctx
            .transform()
            .map(|transform| transform.position.y < 1.5)
            .unwrap_or(false);
        if resting {
            self.landed_for += fixed_dt;
            if self.landed_for > 1.0 {
                log::info!("crate settled, despawning");
                ctx.destroy();
            }
        }
    }

    fn on_destroy(&mut self, _ctx: &mut ObjectContext<'_>) {
        log::info!("crate destroyed");
    }
}

fn spawn_spinner(scene: &mut Scene, name: &str) -> ObjectKey {
    let object = scene.create_object_with_tag(name, "Spinner");
    scene.add_component(
        object,
        ComponentData::Visualizer(Visualizer::new("cube").with_color(0.9, 0.6, 0.2, 1.0)),
    );
    scene.set_behavior(object, Box::new(Spinner { speed: 1.2 }));
    object
}

fn spawn_falling_crate(scene: &mut Scene, name: &str) -> ObjectKey {
    let object = scene.create_object_with_tag(name, "FallingCrate");
    if let Some(transform) = scene.transform_of_mut(object) {
        transform.position = Vec3::new(0.0, 8.0, 0.0);
    }
    scene.add_component(
        object,
        ComponentData::Collider(Collider::new_box(Vec3::new(0.5, 0.5, 0.5))),
    );
    scene.add_component(
        object,
        ComponentData::PhysicsBody(PhysicsBody::new().with_mass(2.0)),
    );
    scene.set_behavior(object, Box::new(FallingCrate { landed_for: 0.0 }));
    object
}

fn build_scene(scene: &mut Scene) {
    if let Err(err) = scene.registry_mut().register("Spinner", spawn_spinner) {
        log::error!("type registration failed: {err}");
    }
    if let Err(err) = scene.registry_mut().register("FallingCrate", spawn_falling_crate) {
        log::error!("type registration failed: {err}");
    }

    let ground = scene.create_object("Ground");
    scene.add_component(
        ground,
        ComponentData::Collider(Collider::new_box(Vec3::new(20.0, 1.0, 20.0))),
    );
    scene.add_component(
        ground,
        ComponentData::Visualizer(Visualizer::new("slab").with_color(0.3, 0.3, 0.35, 1.0)),
    );

    let _ = scene.spawn("Camera", "Main Camera");
    let _ = scene.spawn("Spinner", "Beacon");
    let _ = scene.spawn("FallingCrate", "Crate");
}

fn main() -> Result<(), EngineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("creating sandbox...");
    let mut engine = Engine::new(EngineConfig::default())?;

    {
        let mut scene = engine.scene().borrow_mut();
        build_scene(&mut scene);
        log::info!(
            "scene ready: {} objects, {} wireframes",
            scene.object_count(),
            scene.collect_wireframes().len()
        );
    }
    engine.set_play_mode(PlayMode::Play);

    // Ten simulated seconds at 60 Hz
    engine.run_frames(600, 1.0 / 60.0);

    let scene = engine.scene().borrow();
    log::info!("sandbox finished with {} objects", scene.object_count());
    Ok(())
}
