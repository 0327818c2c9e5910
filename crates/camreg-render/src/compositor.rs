//! Layer compositing: draw order and raster state around each layer.
//!
//! The background photo is drawn first with depth testing and blending off.
//! The overlay is drawn on top with both turned on, inside a
//! [`ScopedRasterState`] that restores the previous state however the draw
//! ends.

use std::fmt;
use std::ops::{Deref, DerefMut};

use camreg_core::{CompositeTransform, Mat4};

use crate::error::RenderResult;

/// Uniform name of the background quad transform.
pub const BACKGROUND_MVP: &str = "background.mvp";
/// Uniform name of the overlay's intrinsics-times-pose matrix.
pub const OVERLAY_CAMERA: &str = "overlay.camera";
/// Uniform name of the overlay's viewport projection.
pub const OVERLAY_VIEWPORT: &str = "overlay.viewport";

/// Depth and blend state applied to draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    /// Test fragments against (and write to) the depth buffer.
    pub depth_test: bool,
    /// Alpha-blend fragments over the target.
    pub blend: bool,
}

impl RasterState {
    /// Depth test and blending off.
    pub const DEFAULT: Self = Self {
        depth_test: false,
        blend: false,
    };

    /// Depth test and blending on.
    pub const OVERLAY: Self = Self {
        depth_test: true,
        blend: true,
    };

    /// Every combination, for building one pipeline per state.
    pub const ALL: [Self; 4] = [
        Self::DEFAULT,
        Self {
            depth_test: true,
            blend: false,
        },
        Self {
            depth_test: false,
            blend: true,
        },
        Self::OVERLAY,
    ];
}

impl Default for RasterState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RasterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |b| if b { "on" } else { "off" };
        write!(
            f,
            "depth {} / blend {}",
            on_off(self.depth_test),
            on_off(self.blend)
        )
    }
}

/// The two layers a frame is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// The photograph.
    Background,
    /// The projected cuboid.
    Overlay,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Background => f.write_str("background"),
            Layer::Overlay => f.write_str("overlay"),
        }
    }
}

/// The GPU binding layer the compositor drives.
pub trait DrawTarget {
    /// Submits a 4x4 matrix under a uniform name before the next draw.
    fn upload_matrix(&mut self, name: &str, matrix: Mat4) -> RenderResult<()>;

    /// Returns the raster state the next draw will use.
    fn raster_state(&self) -> RasterState;

    /// Sets the raster state for subsequent draws.
    fn set_raster_state(&mut self, state: RasterState);

    /// Draws a layer with the current raster state.
    fn draw(&mut self, layer: Layer) -> RenderResult<()>;
}

/// Sets a raster state for its lifetime and restores the previous one on drop.
pub struct ScopedRasterState<'a, T: DrawTarget + ?Sized> {
    target: &'a mut T,
    previous: RasterState,
}

impl<'a, T: DrawTarget + ?Sized> ScopedRasterState<'a, T> {
    /// Applies `state` to `target` until the guard is dropped.
    pub fn new(target: &'a mut T, state: RasterState) -> Self {
        let previous = target.raster_state();
        target.set_raster_state(state);
        Self { target, previous }
    }
}

impl<T: DrawTarget + ?Sized> Deref for ScopedRasterState<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: DrawTarget + ?Sized> DerefMut for ScopedRasterState<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: DrawTarget + ?Sized> Drop for ScopedRasterState<'_, T> {
    fn drop(&mut self) {
        self.target.set_raster_state(self.previous);
    }
}

/// Which layers are drawn and with what overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositePolicy {
    /// Draw the photograph.
    pub background: bool,
    /// Draw the overlay.
    pub overlay: bool,
    /// Raster state for the overlay draw.
    pub overlay_state: RasterState,
}

impl CompositePolicy {
    /// Photograph with the overlay on top.
    #[must_use]
    pub fn augmented() -> Self {
        Self {
            background: true,
            overlay: true,
            overlay_state: RasterState::OVERLAY,
        }
    }

    /// Photograph only.
    #[must_use]
    pub fn background_only() -> Self {
        Self {
            overlay: false,
            ..Self::augmented()
        }
    }

    /// Overlay only, over the clear color.
    #[must_use]
    pub fn overlay_only() -> Self {
        Self {
            background: false,
            ..Self::augmented()
        }
    }
}

impl Default for CompositePolicy {
    fn default() -> Self {
        Self::augmented()
    }
}

/// Matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    /// Background quad transform.
    pub background_mvp: Mat4,
    /// Overlay transform chain.
    pub overlay: CompositeTransform,
}

/// Issues one frame's draws against a [`DrawTarget`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    policy: CompositePolicy,
}

impl Compositor {
    /// Creates a compositor for `policy`.
    #[must_use]
    pub fn new(policy: CompositePolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> CompositePolicy {
        self.policy
    }

    /// Draws the enabled layers, background first.
    ///
    /// Errors from the target are returned as they are. The target's raster
    /// state is back to [`RasterState::DEFAULT`] afterwards on every path.
    pub fn draw_frame<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        matrices: &FrameMatrices,
    ) -> RenderResult<()> {
        target.set_raster_state(RasterState::DEFAULT);

        if self.policy.background {
            target.upload_matrix(BACKGROUND_MVP, matrices.background_mvp)?;
            target.draw(Layer::Background)?;
        }

        if self.policy.overlay {
            target.upload_matrix(OVERLAY_CAMERA, matrices.overlay.camera)?;
            target.upload_matrix(OVERLAY_VIEWPORT, matrices.overlay.viewport)?;
            let mut scoped = ScopedRasterState::new(target, self.policy.overlay_state);
            scoped.draw(Layer::Overlay)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use camreg_core::{
        composite, viewport_projection, CameraIntrinsics, CameraPose, DepthRange, Vec3,
    };
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Upload(String),
        SetState(RasterState),
        Draw(Layer, RasterState),
    }

    #[derive(Default)]
    struct RecordingTarget {
        state: RasterState,
        calls: Vec<Call>,
        fail_on: Option<Layer>,
    }

    impl DrawTarget for RecordingTarget {
        fn upload_matrix(&mut self, name: &str, _matrix: Mat4) -> RenderResult<()> {
            match name {
                BACKGROUND_MVP | OVERLAY_CAMERA | OVERLAY_VIEWPORT => {
                    self.calls.push(Call::Upload(name.to_string()));
                    Ok(())
                }
                _ => Err(RenderError::UnknownUniform(name.to_string())),
            }
        }

        fn raster_state(&self) -> RasterState {
            self.state
        }

        fn set_raster_state(&mut self, state: RasterState) {
            self.state = state;
            self.calls.push(Call::SetState(state));
        }

        fn draw(&mut self, layer: Layer) -> RenderResult<()> {
            self.calls.push(Call::Draw(layer, self.state));
            if self.fail_on == Some(layer) {
                return Err(RenderError::MissingPipeline {
                    layer: layer.to_string(),
                    state: self.state.to_string(),
                });
            }
            Ok(())
        }
    }

    fn matrices() -> FrameMatrices {
        let intrinsics = CameraIntrinsics::new(536.46, 536.41, 342.37, 235.55);
        let pose = CameraPose::from_rodrigues(
            Vec3::new(-0.43, 0.21, 0.06),
            Vec3::new(-65.0, -40.0, 450.0),
        );
        FrameMatrices {
            background_mvp: Mat4::IDENTITY,
            overlay: composite(
                viewport_projection(640.0, 480.0, DepthRange::default()),
                intrinsics.matrix4(),
                pose.matrix(),
            ),
        }
    }

    fn draws(target: &RecordingTarget) -> Vec<(Layer, RasterState)> {
        target
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(layer, state) => Some((*layer, *state)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_augmented_draws_background_then_overlay() {
        let mut target = RecordingTarget::default();
        Compositor::new(CompositePolicy::augmented())
            .draw_frame(&mut target, &matrices())
            .unwrap();

        assert_eq!(
            draws(&target),
            vec![
                (Layer::Background, RasterState::DEFAULT),
                (Layer::Overlay, RasterState::OVERLAY),
            ]
        );
        assert_eq!(target.state, RasterState::DEFAULT);
    }

    #[test]
    fn test_uniforms_uploaded_before_their_draw() {
        let mut target = RecordingTarget::default();
        Compositor::default()
            .draw_frame(&mut target, &matrices())
            .unwrap();

        let position = |call: &Call| target.calls.iter().position(|c| c == call).unwrap();
        let background_draw = position(&Call::Draw(Layer::Background, RasterState::DEFAULT));
        let overlay_draw = position(&Call::Draw(Layer::Overlay, RasterState::OVERLAY));
        let upload = |name: &str| position(&Call::Upload(name.to_string()));
        assert!(upload(BACKGROUND_MVP) < background_draw);
        assert!(upload(OVERLAY_CAMERA) < overlay_draw);
        assert!(upload(OVERLAY_VIEWPORT) < overlay_draw);
    }

    #[test]
    fn test_state_restored_after_failed_overlay_draw() {
        let mut target = RecordingTarget {
            fail_on: Some(Layer::Overlay),
            ..RecordingTarget::default()
        };
        let result = Compositor::default().draw_frame(&mut target, &matrices());

        assert!(matches!(result, Err(RenderError::MissingPipeline { .. })));
        assert_eq!(target.state, RasterState::DEFAULT);
        assert_eq!(
            target.calls.last(),
            Some(&Call::SetState(RasterState::DEFAULT))
        );
    }

    #[test]
    fn test_failed_background_draw_skips_overlay() {
        let mut target = RecordingTarget {
            fail_on: Some(Layer::Background),
            ..RecordingTarget::default()
        };
        assert!(Compositor::default()
            .draw_frame(&mut target, &matrices())
            .is_err());
        let background_only = vec![(Layer::Background, RasterState::DEFAULT)];
        assert_eq!(draws(&target), background_only);
    }

    #[test]
    fn test_policy_presets_select_layers() {
        let mut target = RecordingTarget::default();
        Compositor::new(CompositePolicy::background_only())
            .draw_frame(&mut target, &matrices())
            .unwrap();
        let background_only = vec![(Layer::Background, RasterState::DEFAULT)];
        assert_eq!(draws(&target), background_only);

        let mut target = RecordingTarget::default();
        Compositor::new(CompositePolicy::overlay_only())
            .draw_frame(&mut target, &matrices())
            .unwrap();
        assert_eq!(draws(&target), vec![(Layer::Overlay, RasterState::OVERLAY)]);
    }

    #[test]
    fn test_scoped_state_restores_outer_state() {
        let outer = RasterState {
            depth_test: true,
            blend: false,
        };
        let mut target = RecordingTarget {
            state: outer,
            ..RecordingTarget::default()
        };
        {
            let mut scoped = ScopedRasterState::new(&mut target, RasterState::OVERLAY);
            assert_eq!(scoped.raster_state(), RasterState::OVERLAY);
            scoped.draw(Layer::Overlay).unwrap();
        }
        assert_eq!(target.state, outer);
        assert_eq!(
            target.calls,
            vec![
                Call::SetState(RasterState::OVERLAY),
                Call::Draw(Layer::Overlay, RasterState::OVERLAY),
                Call::SetState(outer),
            ]
        );
    }

    fn any_state() -> impl Strategy<Value = RasterState> {
        (any::<bool>(), any::<bool>())
            .prop_map(|(depth_test, blend)| RasterState { depth_test, blend })
    }

    proptest! {
        #[test]
        fn prop_frame_ends_in_default_state(
            initial in any_state(),
            overlay_state in any_state(),
            background in any::<bool>(),
            overlay in any::<bool>(),
            fail_on in prop_oneof![
                Just(None),
                Just(Some(Layer::Background)),
                Just(Some(Layer::Overlay)),
            ],
        ) {
            let mut target = RecordingTarget {
                state: initial,
                fail_on,
                ..RecordingTarget::default()
            };
            let policy = CompositePolicy { background, overlay, overlay_state };
            let _ = Compositor::new(policy).draw_frame(&mut target, &matrices());
            prop_assert_eq!(target.state, RasterState::DEFAULT);
            for (layer, state) in draws(&target) {
                match layer {
                    Layer::Background => prop_assert_eq!(state, RasterState::DEFAULT),
                    Layer::Overlay => prop_assert_eq!(state, overlay_state),
                }
            }
        }
    }
}
