//! The per-frame scheduler.

use std::fmt;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::input::InputSnapshot;
use crate::render::{ClearColor, RenderDispatch, RenderTargetId};

use super::roles::{DrawContext, Drawable, Updatable, UpdateContext};

/// Handle to a registered updatable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdatableId(u64);

/// Handle to a registered drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawableId(u64);

/// Handle to a render group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(u64);

impl fmt::Display for UpdatableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "updatable #{}", self.0)
    }
}

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawable #{}", self.0)
    }
}

/// Drawables that share a render target and its clear colour.
struct RenderGroup {
    id: GroupId,
    target: RenderTargetId,
    clear: ClearColor,
    drawables: Vec<(DrawableId, Box<dyn Drawable>)>,
}

/// One camera, the updatables that drive it and the world, and the render
/// groups that draw the result.
///
/// Each [`tick`](Self::tick) runs every updatable in registration order, then
/// every render group in registration order, clearing each group's target
/// before its drawables run. Drawables therefore always observe the state
/// produced by the same tick's updates.
///
/// # Failure policy
///
/// An entity that returns a recoverable error is logged and skipped for that
/// tick; the rest of the frame carries on. A fatal error (see
/// [`Error::is_fatal`]) stops the tick immediately and is returned.
pub struct Scene {
    camera: Camera,
    updatables: Vec<(UpdatableId, Box<dyn Updatable>)>,
    groups: Vec<RenderGroup>,
    /// Index into `groups`; groups are never removed.
    default_group: Option<usize>,
    screen_clear: ClearColor,
    next_id: u64,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            updatables: Vec::new(),
            groups: Vec::new(),
            default_group: None,
            screen_clear: ClearColor::default(),
            next_id: 0,
        }
    }

    /// Sets the clear colour of the screen group, now or when it is created.
    pub fn with_screen_clear(mut self, clear: ClearColor) -> Self {
        self.screen_clear = clear;
        if let Some(index) = self.default_group {
            self.groups[index].clear = clear;
        }
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Registers an updatable after all existing ones.
    pub fn add_updatable(&mut self, updatable: impl Updatable + 'static) -> UpdatableId {
        let id = UpdatableId(self.next_id());
        self.updatables.push((id, Box::new(updatable)));
        id
    }

    /// Registers a closure as an updatable.
    pub fn on_update<F>(&mut self, f: F) -> UpdatableId
    where
        F: FnMut(&mut UpdateContext<'_>) -> Result<()> + 'static,
    {
        self.add_updatable(f)
    }

    pub fn remove_updatable(&mut self, id: UpdatableId) -> Option<Box<dyn Updatable>> {
        let index = self.updatables.iter().position(|(i, _)| *i == id)?;
        Some(self.updatables.remove(index).1)
    }

    /// Adds a render group drawn after all existing groups.
    ///
    /// Groups that render into offscreen targets must be added before the
    /// groups that sample them.
    pub fn add_group(&mut self, target: RenderTargetId, clear: ClearColor) -> GroupId {
        let id = GroupId(self.next_id());
        self.groups.push(RenderGroup {
            id,
            target,
            clear,
            drawables: Vec::new(),
        });
        id
    }

    /// The group [`add_drawable`](Self::add_drawable) uses. Created on first
    /// use, targeting the screen with the screen clear colour.
    pub fn screen_group(&mut self) -> GroupId {
        let index = self.screen_group_index();
        self.groups[index].id
    }

    fn screen_group_index(&mut self) -> usize {
        if let Some(index) = self.default_group {
            return index;
        }
        self.add_group(RenderTargetId::Screen, self.screen_clear);
        let index = self.groups.len() - 1;
        self.default_group = Some(index);
        index
    }

    /// Changes the clear colour of a group. Returns false for an unknown group.
    pub fn set_clear(&mut self, group: GroupId, clear: ClearColor) -> bool {
        match self.groups.iter_mut().find(|g| g.id == group) {
            Some(g) => {
                g.clear = clear;
                true
            }
            None => false,
        }
    }

    /// Registers a drawable in the screen group.
    pub fn add_drawable(&mut self, drawable: impl Drawable + 'static) -> DrawableId {
        let index = self.screen_group_index();
        let id = DrawableId(self.next_id());
        self.groups[index].drawables.push((id, Box::new(drawable)));
        id
    }

    /// Registers a closure as a drawable in the screen group.
    pub fn on_draw<F>(&mut self, f: F) -> DrawableId
    where
        F: FnMut(&mut DrawContext<'_>) -> Result<()> + 'static,
    {
        self.add_drawable(f)
    }

    /// Registers a drawable in `group`, after the group's existing drawables.
    pub fn add_drawable_to(
        &mut self,
        group: GroupId,
        drawable: impl Drawable + 'static,
    ) -> Option<DrawableId> {
        let id = DrawableId(self.next_id());
        let group = self.groups.iter_mut().find(|g| g.id == group)?;
        group.drawables.push((id, Box::new(drawable)));
        Some(id)
    }

    pub fn remove_drawable(&mut self, id: DrawableId) -> Option<Box<dyn Drawable>> {
        self.groups.iter_mut().find_map(|group| {
            let index = group.drawables.iter().position(|(i, _)| *i == id)?;
            Some(group.drawables.remove(index).1)
        })
    }

    pub fn updatable_count(&self) -> usize {
        self.updatables.len()
    }

    pub fn drawable_count(&self) -> usize {
        self.groups.iter().map(|g| g.drawables.len()).sum()
    }

    /// Runs every updatable once, in registration order.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot) -> Result<()> {
        let mut ctx = UpdateContext {
            dt,
            input,
            camera: &mut self.camera,
        };
        for (id, updatable) in &mut self.updatables {
            if let Err(err) = updatable.update(&mut ctx) {
                triage(err, *id)?;
            }
        }
        Ok(())
    }

    /// Clears each group's target and runs its drawables, group by group.
    pub fn draw(&mut self, dispatch: &mut dyn RenderDispatch) -> Result<()> {
        for group in &mut self.groups {
            if let Err(err) = dispatch.begin_target(group.target, group.clear) {
                triage(err, format_args!("render group for {:?}", group.target))?;
                continue;
            }

            let mut ctx = DrawContext {
                camera: &self.camera,
                dispatch: &mut *dispatch,
                target: group.target,
            };
            for (id, drawable) in &mut group.drawables {
                if let Err(err) = drawable.draw(&mut ctx) {
                    triage(err, *id)?;
                }
            }
        }
        Ok(())
    }

    /// One frame: [`update`](Self::update) then [`draw`](Self::draw).
    pub fn tick(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        dispatch: &mut dyn RenderDispatch,
    ) -> Result<()> {
        self.update(dt, input)?;
        self.draw(dispatch)
    }
}

/// Propagates fatal errors; logs and swallows the rest.
fn triage(err: Error, source: impl fmt::Display) -> Result<()> {
    if err.is_fatal() {
        return Err(err);
    }
    log::warn!("skipping {source} this tick: {err}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SingularMatrix;
    use crate::primitives::ShapeKind;
    use crate::render::{DrawCall, Pipeline};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    enum Event {
        Begin(RenderTargetId),
        Draw(ShapeKind),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        reject: Option<RenderTargetId>,
    }

    impl RenderDispatch for Recorder {
        fn begin_target(&mut self, target: RenderTargetId, _clear: ClearColor) -> Result<()> {
            if self.reject == Some(target) {
                return Err(Error::UnknownTarget(target));
            }
            self.events.push(Event::Begin(target));
            Ok(())
        }

        fn submit(&mut self, call: DrawCall) -> Result<()> {
            self.events.push(Event::Draw(call.shape));
            Ok(())
        }
    }

    fn draw(kind: ShapeKind) -> impl FnMut(&mut DrawContext<'_>) -> Result<()> {
        move |ctx: &mut DrawContext<'_>| {
            ctx.submit(DrawCall {
                shape: kind,
                pipeline: Pipeline::Mesh,
                model: glam::Mat4::IDENTITY,
                view: ctx.camera.world_to_view()?,
                projection: ctx.camera.projection(),
                color: Default::default(),
                texture: None,
            })
        }
    }

    #[test]
    fn updates_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = Scene::new(Camera::default());
        for n in 0..3 {
            let log = Rc::clone(&log);
            scene.on_update(move |_| {
                log.borrow_mut().push(n);
                Ok(())
            });
        }
        scene.update(0.016, &InputSnapshot::idle()).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn groups_clear_before_their_drawables() {
        let mut scene = Scene::new(Camera::default());
        let offscreen = scene.add_group(RenderTargetId::Offscreen(0), ClearColor::BLACK);
        scene.add_drawable_to(offscreen, draw(ShapeKind::LetterF)).unwrap();
        scene.add_drawable(draw(ShapeKind::Quad));
        scene.add_drawable(draw(ShapeKind::Skybox));

        let mut recorder = Recorder::default();
        scene.draw(&mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                Event::Begin(RenderTargetId::Offscreen(0)),
                Event::Draw(ShapeKind::LetterF),
                Event::Begin(RenderTargetId::Screen),
                Event::Draw(ShapeKind::Quad),
                Event::Draw(ShapeKind::Skybox),
            ]
        );
    }

    #[test]
    fn unknown_target_skips_only_its_group() {
        let mut scene = Scene::new(Camera::default());
        let missing = scene.add_group(RenderTargetId::Offscreen(7), ClearColor::BLACK);
        scene.add_drawable_to(missing, draw(ShapeKind::Cube)).unwrap();
        scene.add_drawable(draw(ShapeKind::Quad));

        let mut recorder = Recorder {
            reject: Some(RenderTargetId::Offscreen(7)),
            ..Default::default()
        };
        scene.draw(&mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                Event::Begin(RenderTargetId::Screen),
                Event::Draw(ShapeKind::Quad)
            ]
        );
    }

    #[test]
    fn recoverable_errors_skip_the_entity() {
        let ran = Rc::new(RefCell::new(false));
        let mut scene = Scene::new(Camera::default());
        scene.on_update(|_| Err(Error::entity("flaky")));
        let flag = Rc::clone(&ran);
        scene.on_update(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });
        scene.update(0.016, &InputSnapshot::idle()).unwrap();
        assert!(*ran.borrow());
    }

    #[test]
    fn fatal_errors_abort_the_tick() {
        let drawn = Rc::new(RefCell::new(false));
        let mut scene = Scene::new(Camera::default());
        scene.on_update(|_| Err(SingularMatrix { determinant: 0.0 }.into()));
        let flag = Rc::clone(&drawn);
        scene.on_draw(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        let err = scene
            .tick(0.016, &InputSnapshot::idle(), &mut Recorder::default())
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(!*drawn.borrow());
    }

    #[test]
    fn handles_remove_entries() {
        let mut scene = Scene::new(Camera::default());
        let u = scene.on_update(|_| Ok(()));
        let d = scene.add_drawable(draw(ShapeKind::Cube));
        assert_eq!((scene.updatable_count(), scene.drawable_count()), (1, 1));

        assert!(scene.remove_updatable(u).is_some());
        assert!(scene.remove_drawable(d).is_some());
        assert!(scene.remove_drawable(d).is_none());
        assert_eq!((scene.updatable_count(), scene.drawable_count()), (0, 0));

        let mut recorder = Recorder::default();
        scene.draw(&mut recorder).unwrap();
        assert_eq!(recorder.events, vec![Event::Begin(RenderTargetId::Screen)]);
    }

    #[test]
    fn drawables_see_updated_camera() {
        use crate::transform::Translatable;

        let mut scene = Scene::new(Camera::default());
        scene.on_update(|ctx| {
            ctx.camera.translate([0.0, 0.0, ctx.dt]);
            Ok(())
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scene.on_draw(move |ctx| {
            sink.borrow_mut().push(ctx.camera.world_to_view()?.w_axis.z);
            Ok(())
        });

        let mut recorder = Recorder::default();
        for _ in 0..2 {
            scene
                .tick(1.0, &InputSnapshot::idle(), &mut recorder)
                .unwrap();
        }
        assert_eq!(*seen.borrow(), vec![-1.0, -2.0]);
        assert_eq!(scene.camera().view_recomputations(), 2);
    }

    #[test]
    fn screen_clear_applies_to_the_default_group() {
        use crate::render::RecordingDispatch;

        let mut scene = Scene::new(Camera::default()).with_screen_clear(ClearColor::WHITE);
        scene.add_group(RenderTargetId::Offscreen(1), ClearColor::RED);
        scene.add_drawable(draw(ShapeKind::Cube));

        let mut dispatch = RecordingDispatch::default();
        scene.draw(&mut dispatch).unwrap();
        assert_eq!(
            dispatch.clears(),
            &[
                (RenderTargetId::Offscreen(1), ClearColor::RED),
                (RenderTargetId::Screen, ClearColor::WHITE),
            ]
        );
    }
}
