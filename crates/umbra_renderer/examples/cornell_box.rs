//! Cornell box example.
//!
//! Renders the classic Cornell box with importance-sampled lighting and
//! writes `cornell_box.ppm` plus a PNG copy. Pass `smoke` to replace the two
//! boxes with constant-density volumes, or a path to a JSON render config.
//!
//! ```text
//! cargo run --release --example cornell_box -- [smoke] [config.json]
//! ```

use anyhow::{Context, Result};
use env_logger::Env;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use umbra_renderer::{
    make_box, render, BvhNode, Camera, CameraSettings, Color, ConstantMedium, DiffuseLight,
    Hittable, HittableList, Lambertian, LogProgress, Material, Quad, RenderConfig, RotateY,
    Translate, Vec3,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut smoke = false;
    let mut config = RenderConfig {
        samples_per_pixel: 100,
        max_depth: 50,
        ..RenderConfig::default()
    };
    for arg in std::env::args().skip(1) {
        if arg == "smoke" {
            smoke = true;
        } else {
            let json = std::fs::read_to_string(&arg).with_context(|| format!("reading {arg}"))?;
            config = RenderConfig::from_json(&json)?;
        }
    }

    let start = std::time::Instant::now();
    let (world, lights) = build_scene(smoke);
    log::info!("Scene built in {:?}", start.elapsed());

    let mut camera: Camera = CameraSettings {
        aspect_ratio: 1.0,
        image_width: 600,
        vfov: 40.0,
        look_from: Vec3::new(278.0, 278.0, -800.0),
        look_at: Vec3::new(278.0, 278.0, 0.0),
        vup: Vec3::Y,
        defocus_angle: 0.0,
        focus_dist: 10.0,
    }
    .into();

    // 600 rows plus the final unit
    let progress = LogProgress::new(601, 10);
    let image = render(&mut camera, &world, &lights, &config, &progress)?;

    let filename = if smoke { "cornell_smoke" } else { "cornell_box" };
    let mut writer = BufWriter::new(File::create(format!("{filename}.ppm"))?);
    image.write_ppm(&mut writer)?;
    log::info!("Saved to {filename}.ppm");

    if let Some(png) = image.to_rgb_image() {
        png.save(format!("{filename}.png"))
            .with_context(|| format!("writing {filename}.png"))?;
        log::info!("Saved to {filename}.png");
    }

    Ok(())
}

fn build_scene(smoke: bool) -> (BvhNode, HittableList) {
    let red: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.73, 0.73, 0.73)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(15.0)));

    let mut world = HittableList::new();

    // Walls
    world.add(Quad::new(Vec3::new(555.0, 0.0, 0.0), Vec3::new(0.0, 555.0, 0.0), Vec3::new(0.0, 0.0, 555.0), green));
    world.add(Quad::new(Vec3::ZERO, Vec3::new(0.0, 555.0, 0.0), Vec3::new(0.0, 0.0, 555.0), red));
    world.add(Quad::new(Vec3::ZERO, Vec3::new(555.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 555.0), white.clone()));
    world.add(Quad::new(
        Vec3::new(555.0, 555.0, 555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    ));
    world.add(Quad::new(Vec3::new(0.0, 0.0, 555.0), Vec3::new(555.0, 0.0, 0.0), Vec3::new(0.0, 555.0, 0.0), white.clone()));

    // Ceiling light, facing down; shared between the world and the light list
    let light_quad: Arc<dyn Hittable> = Arc::new(Quad::new(
        Vec3::new(343.0, 550.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        light,
    ));
    world.add_shared(light_quad.clone());
    let mut lights = HittableList::new();
    lights.add_shared(light_quad);

    // Boxes
    let tall: Arc<dyn Hittable> = Arc::new(make_box(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white.clone()));
    let tall: Arc<dyn Hittable> = Arc::new(RotateY::new(tall, 15.0));
    let tall: Arc<dyn Hittable> = Arc::new(Translate::new(tall, Vec3::new(265.0, 0.0, 295.0)));

    let short: Arc<dyn Hittable> = Arc::new(make_box(Vec3::ZERO, Vec3::splat(165.0), white));
    let short: Arc<dyn Hittable> = Arc::new(RotateY::new(short, -18.0));
    let short: Arc<dyn Hittable> = Arc::new(Translate::new(short, Vec3::new(130.0, 0.0, 65.0)));

    if smoke {
        world.add(ConstantMedium::new(tall, 0.01, Color::ZERO));
        world.add(ConstantMedium::new(short, 0.01, Color::ONE));
    } else {
        world.add_shared(tall);
        world.add_shared(short);
    }

    log::info!("Created {} objects", world.len());
    (BvhNode::from_list(world), lights)
}
