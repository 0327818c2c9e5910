//! Camera-to-clip-space projection.
//!
//! Every matrix here follows glam's column-vector convention (`M * v`) and
//! column-major storage, which is also what WGSL `mat4x4<f32>` expects when
//! uploaded with `to_cols_array_2d`. Entries are documented as `(row, col)`.
//!
//! The overlay vertex stage evaluates
//!
//! ```text
//! q    = intrinsics * pose * [p, 1]          // [fx*x + cx*z, fy*y + cy*z, z, z]
//! q'   = [q.x / q.z, q.y / q.z, q.z, 1]      // pixel x/y, camera depth kept
//! clip = viewport * q'
//! ```
//!
//! Folding the divide into the rasterizer's w-divide would also divide depth
//! by z and flatten every overlay vertex onto the same depth, so x and y are
//! divided explicitly and z is carried through untouched.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::frame::FrameInfo;
use crate::intrinsics::CameraIntrinsics;
use crate::pose::CameraPose;

/// Camera-space depth interval mapped onto NDC depth `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    /// Depth mapped to 0.
    pub near: f32,
    /// Depth mapped to 1.
    pub far: f32,
}

impl DepthRange {
    /// Creates a new depth range.
    #[must_use]
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Returns whether `z` falls inside the range.
    #[must_use]
    pub fn contains(&self, z: f32) -> bool {
        z >= self.near && z <= self.far
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 10_000.0,
        }
    }
}

/// Builds the 4x4 projective camera matrix from pinhole intrinsics.
///
/// Starting from the identity: `(0,0) = fx`, `(1,1) = fy`, `(0,2) = cx`,
/// `(1,2) = cy`, and the w row copies z (`(3,2) = 1`, `(3,3) = 0`), so that
/// `M * [x, y, z, 1] = [fx*x + cx*z, fy*y + cy*z, z, z]`.
#[must_use]
pub fn build_intrinsic_matrix(fx: f32, fy: f32, cx: f32, cy: f32) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.x_axis.x = fx;
    m.y_axis.y = fy;
    m.z_axis.x = cx;
    m.z_axis.y = cy;
    m.z_axis.w = 1.0;
    m.w_axis.w = 0.0;
    m
}

/// Builds the 4x4 rigid transform with `rotation` in the upper-left block and
/// `translation` in the last column.
///
/// The rotation is not checked for orthonormality.
#[must_use]
pub fn build_pose_matrix(rotation: Mat3, translation: Vec3) -> Mat4 {
    Mat4::from_cols(
        rotation.x_axis.extend(0.0),
        rotation.y_axis.extend(0.0),
        rotation.z_axis.extend(0.0),
        translation.extend(1.0),
    )
}

/// Builds the orthographic viewport projection for a framebuffer of
/// `width` x `height` pixels.
///
/// Pixel `(0, 0)` (top-left, y down) maps to NDC `(-1, 1)` and
/// `(width, height)` to `(1, -1)`. Camera depth `[near, far]` maps to `[0, 1]`.
#[must_use]
pub fn viewport_projection(width: f32, height: f32, depth: DepthRange) -> Mat4 {
    Mat4::orthographic_lh(0.0, width, height, 0.0, depth.near, depth.far)
}

/// The per-frame transform chain handed to the overlay vertex stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeTransform {
    /// Pixel-to-NDC projection for the current framebuffer.
    pub viewport: Mat4,
    /// Intrinsics times pose. Independent of the framebuffer size.
    pub camera: Mat4,
    /// Viewport times intrinsics times pose.
    pub mvp: Mat4,
}

/// Composes `viewport * intrinsics * pose`: pose applies first, then
/// intrinsics, then the viewport.
#[must_use]
pub fn composite(viewport: Mat4, intrinsics: Mat4, pose: Mat4) -> CompositeTransform {
    let camera = intrinsics * pose;
    CompositeTransform {
        viewport,
        camera,
        mvp: viewport * camera,
    }
}

/// Divides x and y by z and leaves z as it is.
///
/// `v.z` must be non-zero; a point on the camera plane has no projection.
#[must_use]
pub fn perspective_divide_xy(v: Vec4) -> Vec4 {
    Vec4::new(v.x / v.z, v.y / v.z, v.z, 1.0)
}

/// CPU evaluation of the overlay vertex stage for a board-space point.
#[must_use]
pub fn project_vertex(transform: &CompositeTransform, point: Vec3) -> Vec4 {
    transform.viewport * perspective_divide_xy(transform.camera * point.extend(1.0))
}

/// Projects a board-space point straight to pixel coordinates with the
/// classical pinhole model.
#[must_use]
pub fn project_to_pixel(intrinsics: &CameraIntrinsics, pose: &CameraPose, point: Vec3) -> Vec2 {
    intrinsics.project(pose.transform_point(point))
}

/// Maps NDC x/y to pixel coordinates (y down) for a `width` x `height` target.
#[must_use]
pub fn ndc_to_pixel(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height)
}

impl CameraIntrinsics {
    /// Returns the 4x4 projective camera matrix (see [`build_intrinsic_matrix`]).
    #[must_use]
    pub fn matrix4(&self) -> Mat4 {
        build_intrinsic_matrix(self.fx, self.fy, self.cx, self.cy)
    }
}

/// Produces the per-frame [`CompositeTransform`] for a fixed calibration.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionBuilder {
    intrinsics: CameraIntrinsics,
    pose: CameraPose,
    depth_range: DepthRange,
    reference_size: Option<(u32, u32)>,
}

impl ProjectionBuilder {
    /// Creates a builder for the given calibration.
    #[must_use]
    pub fn new(intrinsics: CameraIntrinsics, pose: CameraPose) -> Self {
        Self {
            intrinsics,
            pose,
            depth_range: DepthRange::default(),
            reference_size: None,
        }
    }

    /// Sets the depth range mapped onto NDC depth.
    #[must_use]
    pub fn with_depth_range(mut self, depth_range: DepthRange) -> Self {
        self.depth_range = depth_range;
        self
    }

    /// Sets the image size the intrinsics were calibrated at. Frames of a
    /// different size use intrinsics rescaled to the framebuffer.
    #[must_use]
    pub fn with_reference_size(mut self, width: u32, height: u32) -> Self {
        self.reference_size = Some((width, height));
        self
    }

    /// Returns the calibrated intrinsics.
    #[must_use]
    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    /// Returns the calibrated pose.
    #[must_use]
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Returns the depth range.
    #[must_use]
    pub fn depth_range(&self) -> DepthRange {
        self.depth_range
    }

    /// Returns the intrinsics in effect for a frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn intrinsics_for(&self, frame: FrameInfo) -> CameraIntrinsics {
        match self.reference_size {
            Some((w, h)) if (w, h) != (frame.width, frame.height) && w > 0 && h > 0 => {
                let sx = frame.width as f32 / w as f32;
                let sy = frame.height as f32 / h as f32;
                self.intrinsics.scaled(sx, sy)
            }
            _ => self.intrinsics,
        }
    }

    /// Recomputes the composite transform for the frame's framebuffer size.
    #[must_use]
    pub fn build(&self, frame: FrameInfo) -> CompositeTransform {
        let (width, height) = frame.size_f32();
        composite(
            viewport_projection(width, height, self.depth_range),
            self.intrinsics_for(frame).matrix4(),
            self.pose.matrix(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixture_intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(536.46, 536.41, 342.37, 235.55)
    }

    fn fixture_pose() -> CameraPose {
        CameraPose::from_rodrigues(
            Vec3::new(-0.43, 0.21, 0.06),
            Vec3::new(-65.0, -40.0, 450.0),
        )
    }

    #[test]
    fn test_intrinsic_matrix_entries() {
        let m = build_intrinsic_matrix(2.0, 3.0, 4.0, 5.0);
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];
        assert_eq!(rows[0], Vec4::new(2.0, 0.0, 4.0, 0.0));
        assert_eq!(rows[1], Vec4::new(0.0, 3.0, 5.0, 0.0));
        assert_eq!(rows[2], Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(rows[3], Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn test_intrinsic_matrix_homogeneous_output() {
        let m = build_intrinsic_matrix(2.0, 3.0, 4.0, 5.0);
        let q = m * Vec4::new(1.0, -2.0, 10.0, 1.0);
        assert_eq!(q, Vec4::new(2.0 + 40.0, -6.0 + 50.0, 10.0, 10.0));
    }

    #[test]
    fn test_pose_matrix_translation_in_last_column() {
        let m = build_pose_matrix(Mat3::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.col(3), Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
        let pose = fixture_pose();
        let p = Vec3::new(25.0, 50.0, -10.0);
        let via_matrix = pose.matrix() * p.extend(1.0);
        let error = via_matrix.truncate() - pose.transform_point(p);
        assert!(error.length() < 1e-3);
        assert_eq!(via_matrix.w, 1.0);
    }

    #[test]
    fn test_viewport_maps_corners_y_flipped() {
        for &(w, h) in &[(640.0, 480.0), (1.0, 1.0), (1920.0, 1080.0), (333.0, 77.0)] {
            let v = viewport_projection(w, h, DepthRange::default());
            let corners = [
                (Vec2::new(0.0, 0.0), Vec2::new(-1.0, 1.0)),
                (Vec2::new(w, 0.0), Vec2::new(1.0, 1.0)),
                (Vec2::new(0.0, h), Vec2::new(-1.0, -1.0)),
                (Vec2::new(w, h), Vec2::new(1.0, -1.0)),
            ];
            for (pixel, expected) in corners {
                let ndc = v * Vec4::new(pixel.x, pixel.y, 1.0, 1.0);
                assert!(
                    (ndc.truncate().truncate() - expected).length() < 1e-5,
                    "{pixel:?} mapped to {ndc:?} at {w}x{h}"
                );
                assert_eq!(ndc.w, 1.0);
            }
        }
    }

    #[test]
    fn test_viewport_depth_range() {
        let depth = DepthRange::new(1.0, 101.0);
        let v = viewport_projection(640.0, 480.0, depth);
        assert!((v * Vec4::new(0.0, 0.0, 1.0, 1.0)).z.abs() < 1e-6);
        assert!(((v * Vec4::new(0.0, 0.0, 101.0, 1.0)).z - 1.0).abs() < 1e-6);
        assert!(((v * Vec4::new(0.0, 0.0, 51.0, 1.0)).z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_composite_identity_pose_is_viewport_times_intrinsics() {
        let v = viewport_projection(640.0, 480.0, DepthRange::default());
        let k = fixture_intrinsics().matrix4();
        let t = composite(v, k, build_pose_matrix(Mat3::IDENTITY, Vec3::ZERO));
        assert_eq!(t.mvp, v * k);
        assert_eq!(t.camera, k);

        let p = Vec4::new(12.0, -7.0, 300.0, 1.0);
        let direct = t.mvp * p;
        let staged = v * (k * p);
        assert!((direct - staged).length() <= 1e-4 * staged.length());
    }

    #[test]
    fn test_composite_order_applies_pose_first() {
        let v = viewport_projection(640.0, 480.0, DepthRange::default());
        let k = fixture_intrinsics().matrix4();
        let pose = fixture_pose();
        let t = composite(v, k, pose.matrix());
        let p = Vec3::new(10.0, 20.0, 0.0);
        let expected = v * (k * (pose.matrix() * p.extend(1.0)));
        let actual = t.mvp * p.extend(1.0);
        assert!((expected - actual).length() <= 1e-4 * expected.length());
    }

    #[test]
    fn test_viewport_change_only_touches_xy_rows() {
        let k = fixture_intrinsics().matrix4();
        let pose = fixture_pose().matrix();
        let depth = DepthRange::default();
        let a = composite(viewport_projection(640.0, 480.0, depth), k, pose);
        let b = composite(viewport_projection(1280.0, 720.0, depth), k, pose);

        assert_eq!(a.camera, b.camera);
        assert_eq!(a.mvp.row(2), b.mvp.row(2));
        assert_eq!(a.mvp.row(3), b.mvp.row(3));
        assert_ne!(a.mvp.row(0), b.mvp.row(0));
        assert_ne!(a.mvp.row(1), b.mvp.row(1));
    }

    #[test]
    fn test_project_vertex_matches_pinhole_pixel() {
        let intrinsics = fixture_intrinsics();
        let pose = fixture_pose();
        let frame = FrameInfo::new(640, 480);
        let t = ProjectionBuilder::new(intrinsics, pose).build(frame);
        for p in [
            Vec3::ZERO,
            Vec3::new(75.0, 0.0, 0.0),
            Vec3::new(75.0, 50.0, -50.0),
        ] {
            let clip = project_vertex(&t, p);
            assert_eq!(clip.w, 1.0);
            let pixel = ndc_to_pixel(clip.truncate().truncate(), 640.0, 480.0);
            let expected = project_to_pixel(&intrinsics, &pose, p);
            assert!(
                (pixel - expected).length() < 1e-2,
                "{pixel:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_project_vertex_keeps_depth_ordering() {
        let t = ProjectionBuilder::new(fixture_intrinsics(), CameraPose::identity())
            .with_depth_range(DepthRange::new(1.0, 1001.0))
            .build(FrameInfo::new(640, 480));
        let near = project_vertex(&t, Vec3::new(5.0, 5.0, 100.0));
        let far = project_vertex(&t, Vec3::new(5.0, 5.0, 200.0));
        assert!(near.z < far.z);
        assert!((near.z - 0.099).abs() < 1e-5);
        assert!((far.z - 0.199).abs() < 1e-5);
    }

    #[test]
    fn test_builder_rescales_intrinsics_for_other_frame_sizes() {
        let intrinsics = fixture_intrinsics();
        let builder =
            ProjectionBuilder::new(intrinsics, fixture_pose()).with_reference_size(640, 480);
        assert_eq!(builder.intrinsics_for(FrameInfo::new(640, 480)), intrinsics);

        let doubled = builder.intrinsics_for(FrameInfo::new(1280, 960));
        assert!((doubled.fx - 2.0 * intrinsics.fx).abs() < 1e-3);
        assert!((doubled.cy - 2.0 * intrinsics.cy).abs() < 1e-3);

        // Without a reference size the calibrated values are used as-is.
        let plain = ProjectionBuilder::new(intrinsics, fixture_pose());
        assert_eq!(plain.intrinsics_for(FrameInfo::new(1280, 960)), intrinsics);
    }

    proptest! {
        #[test]
        fn prop_intrinsic_matrix_reproduces_pinhole(
            fx in 1.0f32..4000.0,
            fy in 1.0f32..4000.0,
            cx in -2000.0f32..2000.0,
            cy in -2000.0f32..2000.0,
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            z in 0.01f32..5000.0,
        ) {
            let q = build_intrinsic_matrix(fx, fy, cx, cy) * Vec4::new(x, y, z, 1.0);
            let h = q / q.w;
            let ex = fx * x / z + cx;
            let ey = fy * y / z + cy;
            let tol_x = 1e-5 * ((fx * x / z).abs() + cx.abs()).max(1.0);
            let tol_y = 1e-5 * ((fy * y / z).abs() + cy.abs()).max(1.0);
            prop_assert!((h.x - ex).abs() <= tol_x, "x: {} vs {}", h.x, ex);
            prop_assert!((h.y - ey).abs() <= tol_y, "y: {} vs {}", h.y, ey);
            prop_assert_eq!(h.z, 1.0);
            prop_assert_eq!(h.w, 1.0);
        }

        #[test]
        fn prop_divide_keeps_z_bits(
            x in -1.0e6f32..1.0e6,
            y in -1.0e6f32..1.0e6,
            z in prop_oneof![-1.0e6f32..-1.0e-6, 1.0e-6f32..1.0e6],
            w in -10.0f32..10.0,
        ) {
            let out = perspective_divide_xy(Vec4::new(x, y, z, w));
            prop_assert_eq!(out.z.to_bits(), z.to_bits());
            prop_assert_eq!(out.w, 1.0);
        }

        #[test]
        fn prop_viewport_corners(w in 1.0f32..8192.0, h in 1.0f32..8192.0) {
            let v = viewport_projection(w, h, DepthRange::default());
            let tl = v * Vec4::new(0.0, 0.0, 1.0, 1.0);
            let br = v * Vec4::new(w, h, 1.0, 1.0);
            let tr = v * Vec4::new(w, 0.0, 1.0, 1.0);
            let bl = v * Vec4::new(0.0, h, 1.0, 1.0);
            prop_assert!((tl.x + 1.0).abs() < 1e-5 && (tl.y - 1.0).abs() < 1e-5);
            prop_assert!((tr.x - 1.0).abs() < 1e-5 && (tr.y - 1.0).abs() < 1e-5);
            prop_assert!((bl.x + 1.0).abs() < 1e-5 && (bl.y + 1.0).abs() < 1e-5);
            prop_assert!((br.x - 1.0).abs() < 1e-5 && (br.y + 1.0).abs() < 1e-5);
        }

        #[test]
        fn prop_viewport_resize_preserves_camera_rows(
            w1 in 16u32..4096, h1 in 16u32..4096,
            w2 in 16u32..4096, h2 in 16u32..4096,
        ) {
            let builder = ProjectionBuilder::new(fixture_intrinsics(), fixture_pose());
            let a = builder.build(FrameInfo::new(w1, h1));
            let b = builder.build(FrameInfo::new(w2, h2));
            prop_assert_eq!(a.camera, b.camera);
            prop_assert_eq!(a.mvp.row(2), b.mvp.row(2));
            prop_assert_eq!(a.mvp.row(3), b.mvp.row(3));
        }
    }
}
