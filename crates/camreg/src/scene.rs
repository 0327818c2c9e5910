//! Scene assembly: a background source, an overlay source and a projection.

use camreg_core::{
    project_to_pixel, Calibration, CamregError, CheckerboardSource, FrameInfo, ImageSource, Options,
    OverlayGeometry, OverlaySource, ProjectionBuilder, Vec3,
};
use camreg_render::{
    background_transform, BackgroundRenderData, CompositePolicy, Compositor, FrameLayers,
    FrameMatrices, OverlayRenderData, RenderEngine, ShaderSources,
};

use crate::error::Result;

/// Image size used when a calibration does not record one.
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (640, 480);

/// Everything needed to draw the augmented view.
///
/// The scene owns its sources and is device-independent; [`OverlayScene::prepare`]
/// turns it into GPU layers for a particular engine.
pub struct OverlayScene {
    background: Box<dyn ImageSource>,
    overlay: Box<dyn OverlaySource>,
    projection: ProjectionBuilder,
    options: Options,
    compositor: Compositor,
    shaders: ShaderSources,
}

/// GPU layers built from an [`OverlayScene`].
pub struct PreparedScene {
    background: BackgroundRenderData,
    overlay: OverlayRenderData,
}

impl PreparedScene {
    /// Returns the layers for frame encoding.
    pub fn layers(&self) -> FrameLayers<'_> {
        FrameLayers {
            background: &self.background,
            overlay: &self.overlay,
        }
    }

    /// Returns the background image size in pixels.
    pub fn image_size(&self) -> (u32, u32) {
        self.background.image_size()
    }
}

impl OverlayScene {
    /// Creates a scene from explicit parts, composited with the augmented policy.
    pub fn new(
        background: Box<dyn ImageSource>,
        overlay: Box<dyn OverlaySource>,
        projection: ProjectionBuilder,
        options: Options,
    ) -> Self {
        Self {
            background,
            overlay,
            projection,
            options,
            compositor: Compositor::new(CompositePolicy::augmented()),
            shaders: ShaderSources::default(),
        }
    }

    /// Creates a scene over `background` using a calibration and the cuboid
    /// described by `options`.
    pub fn from_calibration(
        calibration: &Calibration,
        background: Box<dyn ImageSource>,
        options: Options,
    ) -> Self {
        let projection = calibration.projection(options.depth_range, options.rescale_intrinsics);
        let overlay = Box::new(options.overlay());
        Self::new(background, overlay, projection, options)
    }

    /// Creates a scene whose background is the checkerboard the calibration
    /// was taken of, rendered at the calibrated image size.
    pub fn checkerboard(calibration: &Calibration, options: Options) -> Result<Self> {
        calibration.validate()?;
        let layout = calibration.board.unwrap_or_default();
        layout.validate()?;
        let (width, height) = calibration.image_size.unwrap_or(DEFAULT_IMAGE_SIZE);
        let source = Box::new(CheckerboardSource::new(
            layout,
            calibration.intrinsics,
            calibration.pose,
            width,
            height,
        ));
        Ok(Self::from_calibration(calibration, source, options))
    }

    /// Replaces the compositing policy.
    #[must_use]
    pub fn with_policy(mut self, policy: CompositePolicy) -> Self {
        self.compositor = Compositor::new(policy);
        self
    }

    /// Replaces the layer shaders.
    #[must_use]
    pub fn with_shaders(mut self, shaders: ShaderSources) -> Self {
        self.shaders = shaders;
        self
    }

    /// Returns the compositor.
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Returns the compositing policy.
    pub fn policy(&self) -> CompositePolicy {
        self.compositor.policy()
    }

    /// Returns the viewer options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the projection builder.
    pub fn projection(&self) -> &ProjectionBuilder {
        &self.projection
    }

    /// Returns the clear color.
    pub fn clear_color(&self) -> Vec3 {
        self.options.clear_color
    }

    /// Describes the background source.
    pub fn describe_background(&self) -> String {
        self.background.describe()
    }

    /// Loads the background and overlay and uploads them to `engine`.
    ///
    /// Fails with the overlay errors of [`OverlayScene::overlay_geometry`], or
    /// with the render error of the layer that could not be built.
    pub fn prepare(&self, engine: &RenderEngine) -> Result<PreparedScene> {
        let image = self.background.load()?;
        let pose = self.projection.pose();
        let geometry = self.overlay_geometry()?;

        let formats = engine.target_formats();
        let background = BackgroundRenderData::new(
            &engine.device,
            &engine.queue,
            &image,
            &self.shaders.background,
            formats,
        )?;
        let overlay =
            OverlayRenderData::new(&engine.device, &geometry, &self.shaders.overlay, formats)?;

        let (nearest, farthest) = geometry.camera_depth_bounds(&pose);
        let origin = project_to_pixel(&self.projection.intrinsics(), &pose, Vec3::ZERO);
        log::debug!(
            "prepared {} ({}x{}), depths {nearest:.2}..{farthest:.2}, origin ({:.2}, {:.2})",
            self.background.describe(),
            image.width(),
            image.height(),
            origin.x,
            origin.y
        );

        Ok(PreparedScene {
            background,
            overlay,
        })
    }

    /// Builds the overlay geometry and checks that every vertex is in front
    /// of the camera and inside the depth range the viewport maps.
    ///
    /// Vertices on or behind the camera plane give
    /// [`CamregError::BehindCamera`]; vertices the rasterizer would clip give
    /// [`CamregError::OutsideDepthRange`].
    pub fn overlay_geometry(&self) -> Result<OverlayGeometry> {
        let pose = self.projection.pose();
        let geometry = self.overlay.geometry(&pose)?;
        let (nearest, farthest) = geometry.camera_depth_bounds(&pose);
        if nearest <= 0.0 {
            return Err(CamregError::BehindCamera { depth: nearest }.into());
        }
        let range = self.projection.depth_range();
        if !range.contains(nearest) || !range.contains(farthest) {
            return Err(CamregError::OutsideDepthRange {
                nearest,
                farthest,
                near: range.near,
                far: range.far,
            }
            .into());
        }
        Ok(geometry)
    }

    /// Computes the uniforms for a frame of the given size.
    pub fn frame_matrices(&self, frame: FrameInfo) -> FrameMatrices {
        FrameMatrices {
            background_mvp: background_transform(),
            overlay: self.projection.build(frame),
        }
    }

    /// Initial window size: the configured size, else the background size.
    pub fn preferred_size(&self) -> Result<(u32, u32)> {
        if let Some(size) = self.options.window_size {
            return Ok(size);
        }
        let image = self.background.load()?;
        Ok((image.width(), image.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use camreg_core::{
        BoardLayout, CameraIntrinsics, CameraPose, Cuboid, CuboidOverlay, DepthRange, GrayImage,
        Mat3, Topology, Vec4,
    };

    fn fixture() -> Calibration {
        let mut calibration = Calibration::new(
            CameraIntrinsics::new(536.46, 536.41, 342.37, 235.55),
            CameraPose::from_rodrigues(
                Vec3::new(-0.43, 0.21, 0.06),
                Vec3::new(-65.0, -40.0, 450.0),
            ),
        );
        calibration.image_size = Some((640, 480));
        calibration
    }

    #[test]
    fn test_checkerboard_scene_defaults_to_augmented() {
        let scene = OverlayScene::checkerboard(&fixture(), Options::default()).unwrap();
        assert_eq!(scene.policy(), CompositePolicy::augmented());
        assert_eq!(scene.preferred_size().unwrap(), (640, 480));
        assert!(scene.describe_background().contains("checkerboard"));
    }

    #[test]
    fn test_with_policy_replaces_compositor() {
        let scene = OverlayScene::checkerboard(&fixture(), Options::default())
            .unwrap()
            .with_policy(CompositePolicy::background_only());
        assert!(scene.policy().background);
        assert!(!scene.policy().overlay);
    }

    #[test]
    fn test_window_size_option_wins() {
        let options = Options {
            window_size: Some((800, 600)),
            ..Options::default()
        };
        let scene = OverlayScene::from_calibration(
            &fixture(),
            Box::new(GrayImage::filled(4, 3, 0).unwrap()),
            options,
        );
        assert_eq!(scene.preferred_size().unwrap(), (800, 600));
    }

    #[test]
    fn test_frame_matrices_follow_frame_size() {
        let scene = OverlayScene::checkerboard(&fixture(), Options::default()).unwrap();
        let small = scene.frame_matrices(FrameInfo::new(640, 480));
        let large = scene.frame_matrices(FrameInfo::new(1280, 960));
        assert_eq!(small.background_mvp, background_transform());
        assert_ne!(small.overlay.viewport, large.overlay.viewport);
    }

    #[test]
    fn test_checkerboard_rejects_bad_board() {
        let mut calibration = fixture();
        calibration.board = Some(BoardLayout::new(0, 6, 25.0));
        let result = OverlayScene::checkerboard(&calibration, Options::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_overlay_sources_are_pluggable() {
        let geometry = OverlayGeometry::new(
            vec![Vec3::ZERO, Vec3::X],
            vec![Vec4::ONE, Vec4::ONE],
            None,
            Topology::Lines,
        )
        .unwrap();
        let scene = OverlayScene::new(
            Box::new(GrayImage::filled(2, 2, 7).unwrap()),
            Box::new(geometry),
            fixture().projection(Options::default().depth_range, false),
            Options::default(),
        );
        assert_eq!(scene.preferred_size().unwrap(), (2, 2));

        let cuboid = CuboidOverlay {
            cuboid: Cuboid::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0)),
            ..CuboidOverlay::default()
        };
        let scene = OverlayScene::new(
            Box::new(GrayImage::filled(2, 2, 7).unwrap()),
            Box::new(cuboid),
            fixture().projection(Options::default().depth_range, true),
            Options::default(),
        );
        assert_eq!(scene.overlay_geometry().unwrap().positions().len(), 24);
    }

    #[test]
    fn test_overlay_behind_camera_is_rejected() {
        let mut calibration = fixture();
        calibration.pose = CameraPose::new(Mat3::IDENTITY, Vec3::new(0.0, 0.0, 20.0));
        let options = Options {
            cuboid: Cuboid::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 30.0)),
            ..Options::default()
        };
        let scene = OverlayScene::checkerboard(&calibration, options).unwrap();
        assert!(matches!(
            scene.overlay_geometry(),
            Err(Error::Core(CamregError::BehindCamera { depth })) if depth < 0.0
        ));
    }

    fn small_cube_scene(depth_range: DepthRange) -> OverlayScene {
        // A 2 cm cube 8 cm in front of a camera calibrated in metres.
        let mut calibration = fixture();
        calibration.pose = CameraPose::new(Mat3::IDENTITY, Vec3::new(-0.01, -0.01, 0.08));
        let options = Options {
            cuboid: Cuboid::new(Vec3::ZERO, Vec3::splat(0.02)),
            depth_range,
            ..Options::default()
        };
        OverlayScene::checkerboard(&calibration, options).unwrap()
    }

    #[test]
    fn test_overlay_nearer_than_depth_range_is_rejected() {
        let scene = small_cube_scene(DepthRange::default());
        assert!(matches!(
            scene.overlay_geometry(),
            Err(Error::Core(CamregError::OutsideDepthRange { nearest, near, .. }))
                if nearest < near
        ));

        let scene = small_cube_scene(DepthRange::new(0.01, 10.0));
        assert!(scene.overlay_geometry().is_ok());
    }

    #[test]
    fn test_overlay_beyond_depth_range_is_rejected() {
        let mut calibration = fixture();
        calibration.pose = CameraPose::new(Mat3::IDENTITY, Vec3::new(0.0, 0.0, 20_000.0));
        let scene = OverlayScene::checkerboard(&calibration, Options::default()).unwrap();
        assert!(matches!(
            scene.overlay_geometry(),
            Err(Error::Core(CamregError::OutsideDepthRange { farthest, far, .. }))
                if farthest > far
        ));
    }

    #[test]
    fn test_fixture_overlay_fits_depth_range() {
        let scene = OverlayScene::checkerboard(&fixture(), Options::default()).unwrap();
        let geometry = scene.overlay_geometry().unwrap();
        let (nearest, farthest) = geometry.camera_depth_bounds(&scene.projection().pose());
        assert!(nearest > 300.0 && farthest < 500.0);
    }
}
