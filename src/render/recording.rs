use std::collections::HashSet;

use crate::error::{Error, Result};

use super::{ClearColor, DrawCall, RenderDispatch, RenderTargetId};

/// A dispatch that keeps every clear and draw call instead of rendering.
///
/// Accepts any target unless restricted with [`with_targets`](Self::with_targets).
/// Texture sources are checked like the wgpu backend checks them: the screen
/// and the target being drawn into cannot be sampled.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    known: Option<HashSet<RenderTargetId>>,
    clears: Vec<(RenderTargetId, ClearColor)>,
    calls: Vec<(RenderTargetId, DrawCall)>,
    current: Option<RenderTargetId>,
}

impl RecordingDispatch {
    /// Only `targets` (and the screen) will be accepted.
    pub fn with_targets(targets: impl IntoIterator<Item = RenderTargetId>) -> Self {
        let mut known: HashSet<_> = targets.into_iter().collect();
        known.insert(RenderTargetId::Screen);
        Self {
            known: Some(known),
            ..Default::default()
        }
    }

    fn check(&self, target: RenderTargetId) -> Result<()> {
        match &self.known {
            Some(known) if !known.contains(&target) => Err(Error::UnknownTarget(target)),
            _ => Ok(()),
        }
    }

    /// Targets begun so far, with their clear colours, in order.
    pub fn clears(&self) -> &[(RenderTargetId, ClearColor)] {
        &self.clears
    }

    /// Every accepted draw call, in submission order.
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.iter().map(|(_, call)| *call).collect()
    }

    /// Draw calls that landed in `target`.
    pub fn calls_for(&self, target: RenderTargetId) -> Vec<DrawCall> {
        self.calls
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, call)| *call)
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn reset(&mut self) {
        self.clears.clear();
        self.calls.clear();
        self.current = None;
    }
}

impl RenderDispatch for RecordingDispatch {
    fn begin_target(&mut self, target: RenderTargetId, clear: ClearColor) -> Result<()> {
        self.check(target)?;
        self.clears.push((target, clear));
        self.current = Some(target);
        Ok(())
    }

    fn submit(&mut self, call: DrawCall) -> Result<()> {
        let target = self.current.unwrap_or(RenderTargetId::Screen);
        if let Some(source) = call.texture {
            if source == RenderTargetId::Screen {
                return Err(Error::UnknownTarget(source));
            }
            self.check(source)?;
            if source == target {
                return Err(Error::entity(format!(
                    "{source:?} cannot be sampled while it is being drawn into"
                )));
            }
        }
        self.calls.push((target, call));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ShapeKind;
    use crate::render::{Color, Pipeline};
    use glam::Mat4;

    fn call(texture: Option<RenderTargetId>) -> DrawCall {
        DrawCall {
            shape: ShapeKind::Quad,
            pipeline: Pipeline::Mesh,
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            color: Color::WHITE,
            texture,
        }
    }

    #[test]
    fn restricted_dispatch_rejects_unknown_targets() {
        let mut dispatch = RecordingDispatch::with_targets([RenderTargetId::Offscreen(0)]);
        assert!(dispatch.begin_target(RenderTargetId::Screen, Color::BLACK).is_ok());
        assert!(matches!(
            dispatch.begin_target(RenderTargetId::Offscreen(2), Color::BLACK),
            Err(Error::UnknownTarget(RenderTargetId::Offscreen(2)))
        ));
        assert!(dispatch.submit(call(Some(RenderTargetId::Offscreen(0)))).is_ok());
        assert!(dispatch.submit(call(Some(RenderTargetId::Offscreen(5)))).is_err());
        assert_eq!(dispatch.calls().len(), 1);
    }

    #[test]
    fn screen_and_current_target_cannot_be_sampled() {
        let target = RenderTargetId::Offscreen(0);
        let mut dispatch = RecordingDispatch::with_targets([target]);
        assert!(matches!(
            dispatch.submit(call(Some(RenderTargetId::Screen))),
            Err(Error::UnknownTarget(RenderTargetId::Screen))
        ));

        dispatch.begin_target(target, Color::BLACK).unwrap();
        let err = dispatch.submit(call(Some(target))).unwrap_err();
        assert!(matches!(err, Error::Entity(_)));
        assert!(!err.is_fatal());
        assert!(dispatch.calls().is_empty());
    }

    #[test]
    fn calls_are_attributed_to_the_current_target() {
        let mut dispatch = RecordingDispatch::default();
        dispatch
            .begin_target(RenderTargetId::Offscreen(0), Color::WHITE)
            .unwrap();
        dispatch.submit(call(None)).unwrap();
        dispatch.begin_target(RenderTargetId::Screen, Color::BLACK).unwrap();
        dispatch.submit(call(Some(RenderTargetId::Offscreen(0)))).unwrap();

        assert_eq!(dispatch.calls_for(RenderTargetId::Offscreen(0)).len(), 1);
        assert_eq!(dispatch.calls_for(RenderTargetId::Screen).len(), 1);
        assert_eq!(dispatch.clears().len(), 2);

        dispatch.reset();
        assert!(dispatch.calls().is_empty());
    }
}
