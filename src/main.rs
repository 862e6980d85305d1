//! Debug scene: a small red cube in front of the camera, a skybox, and a
//! spinning "F" rendered offscreen and shown on a quad.
//!
//! ```text
//! vantage-demo [euler|incremental] [skybox-dir]
//! ```
//!
//! Skybox faces are read from `skybox-dir` (right.jpg, left.jpg, top.jpg,
//! bottom.jpg, back.jpg, front.jpg). Missing faces keep placeholder colours.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use vantage::render::{self, ClearColor};
use vantage::{
    AppConfig, Color, ControllerConfig, DrawContext, Drawer, NavigationModel, Rotatable, Scalable,
    Shape, ShapeKind, Translatable,
};

const F_TARGET: u32 = 0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let model: NavigationModel = match args.next() {
        Some(arg) => arg.parse().context("first argument selects the navigation model")?,
        None => NavigationModel::default(),
    };
    let skybox_dir = args.next().map(PathBuf::from);
    log::info!("navigation model: {model:?}");

    let config = AppConfig::new()
        .title("Vantage Debug Scene")
        .size(1280, 720)
        .controller(ControllerConfig::default().model(model));

    vantage::run(config, move |ctx| {
        if let Some(dir) = skybox_dir {
            ctx.load_skybox(dir)?;
        }
        let f_target = ctx.offscreen_target(F_TARGET, 512, 512);

        let mut scene = ctx.scene();
        scene.camera_mut().translate([0.0, 0.0, 2.0]);
        scene.add_updatable(ctx.controller());

        // The offscreen group has to be registered before the screen group samples it.
        let offscreen = scene.add_group(f_target, ClearColor::rgb(0.1, 0.1, 0.15));
        let letter = Rc::new(RefCell::new(Shape::new(ShapeKind::LetterF)));
        letter.borrow_mut().translate([0.0, 0.0, -3.0]);
        let spinning = Rc::clone(&letter);
        scene.on_update(move |ctx| {
            spinning.borrow_mut().rotate_y(ctx.dt);
            Ok(())
        });
        let amber = Color::rgb(1.0, 0.8, 0.2);
        scene.add_drawable_to(offscreen, move |ctx: &mut DrawContext<'_>| {
            render::draw_shape(ctx, &letter.borrow(), amber)
        });

        let mut cube = Shape::new(ShapeKind::Cube);
        cube.scale_uniform(0.25);
        scene.add_drawable(Drawer::shared(cube, render::solid(Color::RED)));

        let mut screen = Shape::new(ShapeKind::Quad);
        screen.translate([1.0, 0.0, -0.5]);
        screen.rotate_y(-0.5);
        scene.add_drawable(Drawer::shared(screen, render::textured(f_target)));

        scene.add_drawable(Drawer::shared(Shape::new(ShapeKind::Skybox), render::skybox()));
        Ok(scene)
    })?;
    Ok(())
}
