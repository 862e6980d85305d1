use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::{Camera, ProjectionParams};
use crate::controller::{CameraController, ControllerConfig};
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render::{ClearColor, RenderTargetId, WgpuDispatch};
use crate::scene::Scene;

/// Configuration for the app window, its camera and the camera controller.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: ClearColor,
    pub camera: ProjectionParams,
    pub controller: ControllerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vantage".to_string(),
            width: 800,
            height: 600,
            clear_color: ClearColor::BLACK,
            camera: ProjectionParams::default(),
            controller: ControllerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: impl Into<ClearColor>) -> Self {
        self.clear_color = color.into();
        self
    }

    pub fn camera(mut self, params: ProjectionParams) -> Self {
        self.camera = params;
        self
    }

    pub fn controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = controller;
        self
    }

    /// Rejects a zero-sized window and degenerate camera or controller settings.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        self.camera.validate()?;
        self.controller.validate()
    }
}

/// Context provided during app setup.
///
/// Builds the pieces a scene is made of from the app configuration and gives
/// access to the render backend for targets and skybox images.
pub struct SetupContext<'a> {
    config: &'a AppConfig,
    dispatch: &'a mut WgpuDispatch,
}

impl SetupContext<'_> {
    pub fn config(&self) -> &AppConfig {
        self.config
    }

    /// Aspect ratio of the window surface.
    pub fn aspect(&self) -> f32 {
        self.dispatch.gpu().aspect()
    }

    /// A camera with the configured projection, fitted to the window.
    pub fn camera(&self) -> Camera {
        Camera::new(self.config.camera.aspect(self.aspect()))
    }

    /// An empty scene around [`camera`](Self::camera), clearing the screen to
    /// the configured colour.
    pub fn scene(&self) -> Scene {
        Scene::new(self.camera()).with_screen_clear(self.config.clear_color)
    }

    /// The configured camera controller, ready to add as an updatable.
    pub fn controller(&self) -> Box<dyn CameraController> {
        self.config.controller.build()
    }

    /// Creates an offscreen target that render groups can draw into.
    pub fn offscreen_target(&mut self, id: u32, width: u32, height: u32) -> RenderTargetId {
        self.dispatch.add_offscreen_target(id, width, height)
    }

    /// Starts loading skybox face images from `dir` in the background. The
    /// first frames show placeholder colours; faces appear as they finish
    /// decoding, and missing ones keep their placeholder.
    pub fn load_skybox(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        self.dispatch.load_skybox_dir(dir)
    }

    /// Escape hatch to the render backend.
    pub fn dispatch(&mut self) -> &mut WgpuDispatch {
        self.dispatch
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext<'_>) -> Result<Scene>>;

/// Opens a window and runs `setup`'s scene until the window closes.
///
/// Each redraw measures the time since the previous one, snapshots input,
/// ticks the scene and presents. The loop stops at the first fatal error,
/// which is returned; recoverable errors are logged by the scene and skipped.
///
/// # Example
/// ```no_run
/// use vantage::{AppConfig, Scalable, Shape, ShapeKind, Translatable, render};
///
/// vantage::run(AppConfig::new().title("Cube"), |ctx| {
///     let mut scene = ctx.scene();
///     scene.camera_mut().translate([0.0, 0.0, 2.0]);
///     scene.add_updatable(ctx.controller());
///
///     let mut cube = Shape::new(ShapeKind::Cube);
///     cube.scale_uniform(0.25);
///     scene.add_drawable(vantage::Drawer::shared(cube, render::solid(render::Color::RED)));
///     Ok(scene)
/// })
/// .unwrap();
/// ```
pub fn run<S>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext<'_>) -> Result<Scene> + 'static,
{
    config.validate()?;

    let event_loop = EventLoop::new().map_err(|err| Error::ResourceCreation {
        resource: "event loop",
        reason: err.to_string(),
    })?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VantageApp::Pending {
        config,
        setup: Some(Box::new(setup)),
    };
    event_loop
        .run_app(&mut app)
        .map_err(|err| Error::ResourceCreation {
            resource: "event loop",
            reason: err.to_string(),
        })?;

    match app {
        VantageApp::Stopped(Some(err)) => Err(err),
        _ => Ok(()),
    }
}

enum VantageApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        dispatch: WgpuDispatch,
        scene: Scene,
        input: Input,
        last_frame: Instant,
    },
    Stopped(Option<Error>),
}

impl VantageApp {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig, setup: SetupFn) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = event_loop
            .create_window(window_attrs)
            .map_err(|err| Error::ResourceCreation {
                resource: "window",
                reason: err.to_string(),
            })?;
        let window = Arc::new(window);

        let gpu = GpuContext::new(window.clone())?;
        let mut dispatch = WgpuDispatch::new(gpu);
        let mut scene = setup(&mut SetupContext {
            config,
            dispatch: &mut dispatch,
        })?;
        scene.camera_mut().set_aspect(dispatch.gpu().aspect());
        log::info!(
            "scene ready: {} updatables, {} drawables",
            scene.updatable_count(),
            scene.drawable_count()
        );

        window.request_redraw();
        Ok(VantageApp::Running {
            window,
            dispatch,
            scene,
            input: Input::new(),
            last_frame: Instant::now(),
        })
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("stopping: {err}");
        event_loop.exit();
        *self = VantageApp::Stopped(Some(err));
    }
}

impl ApplicationHandler for VantageApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let VantageApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };
        match VantageApp::start(event_loop, config, setup) {
            Ok(running) => *self = running,
            Err(err) => self.stop(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let VantageApp::Running {
            window,
            dispatch,
            scene,
            input,
            last_frame,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    dispatch.resize(size.width, size.height);
                    scene.camera_mut().set_aspect(dispatch.gpu().aspect());
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                let snapshot = input.snapshot();
                input.begin_frame();

                let frame = scene
                    .tick(dt, &snapshot, &mut *dispatch)
                    .and_then(|()| dispatch.present());
                if let Err(err) = frame {
                    self.stop(event_loop, err);
                    return;
                }
                window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let VantageApp::Running { input, .. } = self {
            input.handle_device_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.camera.far, 32.0);
    }

    #[test]
    fn validation_rejects_degenerate_settings() {
        assert!(matches!(
            AppConfig::new().size(0, 600).validate(),
            Err(Error::Config(_))
        ));
        assert!(AppConfig::new()
            .camera(ProjectionParams::default().clip_planes(1.0, 0.5))
            .validate()
            .is_err());
        assert!(AppConfig::new()
            .controller(ControllerConfig::default().speed(-1.0))
            .validate()
            .is_err());
    }

    #[test]
    fn builders_set_fields() {
        let config = AppConfig::new()
            .title("Debug")
            .size(640, 480)
            .clear_color([0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.title, "Debug");
        assert_eq!(config.width, 640);
        assert_eq!(config.clear_color, ClearColor::rgb(0.1, 0.2, 0.3));
    }
}
