//! Overlay geometry: the cuboid drawn on top of the calibration target.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{CamregError, Result};
use crate::pose::CameraPose;

/// Primitive topology of an overlay mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Pairs of indices form line segments.
    #[default]
    Lines,
    /// Triples of indices form triangles.
    Triangles,
}

/// How the cuboid overlay is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayStyle {
    /// Twelve colored edges.
    #[default]
    Wireframe,
    /// Six translucent faces.
    Solid,
}

/// An axis-aligned box in board space.
///
/// The base lies on the board plane (`z = origin.z`) and the box rises along
/// `-Z`, which points toward the camera for boards observed from the front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    /// Corner of the base with the smallest x and y.
    pub origin: Vec3,
    /// Extent along x, y, and height above the board.
    pub size: Vec3,
}

impl Cuboid {
    /// Creates a cuboid.
    #[must_use]
    pub fn new(origin: Vec3, size: Vec3) -> Self {
        Self { origin, size }
    }

    /// Returns the eight corners: base counter-clockwise from the origin,
    /// then the cap in the same order.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let Vec3 { x: w, y: h, z: d } = self.size;
        let o = self.origin;
        [
            o,
            o + Vec3::new(w, 0.0, 0.0),
            o + Vec3::new(w, h, 0.0),
            o + Vec3::new(0.0, h, 0.0),
            o + Vec3::new(0.0, 0.0, -d),
            o + Vec3::new(w, 0.0, -d),
            o + Vec3::new(w, h, -d),
            o + Vec3::new(0.0, h, -d),
        ]
    }
}

impl Default for Cuboid {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            size: Vec3::new(75.0, 50.0, 50.0),
        }
    }
}

/// Edge groups of the wireframe cuboid.
const BASE_EDGES: [[u32; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];
const PILLAR_EDGES: [[u32; 2]; 4] = [[0, 4], [1, 5], [2, 6], [3, 7]];
const CAP_EDGES: [[u32; 2]; 4] = [[4, 5], [5, 6], [6, 7], [7, 4]];

/// Faces as corner quads, wound counter-clockwise around the outward normal.
const FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // base, +Z
    [4, 7, 6, 5], // cap, -Z
    [0, 4, 5, 1], // -Y
    [3, 2, 6, 7], // +Y
    [0, 3, 7, 4], // -X
    [1, 5, 6, 2], // +X
];

/// Colors for the wireframe edge groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeColors {
    /// Edges on the board plane.
    pub base: Vec4,
    /// Edges rising from the board.
    pub pillars: Vec4,
    /// Edges of the top face.
    pub cap: Vec4,
}

impl Default for EdgeColors {
    fn default() -> Self {
        Self {
            base: Vec4::new(1.0, 0.0, 0.0, 1.0),
            pillars: Vec4::new(0.0, 1.0, 0.0, 1.0),
            cap: Vec4::new(0.0, 0.4, 1.0, 1.0),
        }
    }
}

/// Which side of the cuboid a face shows to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSet {
    /// Outward normal points toward the camera.
    Front,
    /// Outward normal points away from the camera.
    Back,
}

impl FaceSet {
    /// Classifies a face from its board-space outward normal and center.
    #[must_use]
    pub fn classify(pose: &CameraPose, normal: Vec3, center: Vec3) -> Self {
        let normal_camera = pose.rotation * normal;
        let center_camera = pose.transform_point(center);
        // The camera sits at the origin of camera space.
        if normal_camera.dot(center_camera) < 0.0 {
            FaceSet::Front
        } else {
            FaceSet::Back
        }
    }
}

/// Translucent colors for the solid cuboid, keyed by [`FaceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceColors {
    /// Faces turned toward the camera.
    pub front: Vec4,
    /// Faces turned away from the camera.
    pub back: Vec4,
}

impl FaceColors {
    /// Returns the color for a face set.
    #[must_use]
    pub fn color(&self, set: FaceSet) -> Vec4 {
        match set {
            FaceSet::Front => self.front,
            FaceSet::Back => self.back,
        }
    }
}

impl Default for FaceColors {
    fn default() -> Self {
        Self {
            front: Vec4::new(0.2, 0.85, 0.3, 0.45),
            back: Vec4::new(0.95, 0.3, 0.2, 0.35),
        }
    }
}

/// Static overlay mesh in board space.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayGeometry {
    positions: Vec<Vec3>,
    colors: Vec<Vec4>,
    indices: Option<Vec<u32>>,
    topology: Topology,
}

impl OverlayGeometry {
    /// Creates a mesh, checking the color array and index range.
    pub fn new(
        positions: Vec<Vec3>,
        colors: Vec<Vec4>,
        indices: Option<Vec<u32>>,
        topology: Topology,
    ) -> Result<Self> {
        if colors.len() != positions.len() {
            return Err(CamregError::SizeMismatch {
                expected: positions.len(),
                actual: colors.len(),
            });
        }
        let per_primitive = match topology {
            Topology::Lines => 2,
            Topology::Triangles => 3,
        };
        let count = indices.as_ref().map_or(positions.len(), Vec::len);
        if count % per_primitive != 0 {
            return Err(CamregError::InvalidGeometry(format!(
                "{count} elements do not form whole {topology:?} primitives"
            )));
        }
        if let Some(out_of_range) = indices
            .iter()
            .flatten()
            .find(|&&i| i as usize >= positions.len())
        {
            return Err(CamregError::InvalidGeometry(format!(
                "index {out_of_range} out of range for {} vertices",
                positions.len()
            )));
        }
        Ok(Self {
            positions,
            colors,
            indices,
            topology,
        })
    }

    /// Builds the twelve-edge wireframe of a cuboid.
    #[must_use]
    pub fn cuboid_wireframe(cuboid: &Cuboid, colors: &EdgeColors) -> Self {
        let corners = cuboid.corners();
        let mut positions = Vec::with_capacity(24);
        let mut vertex_colors = Vec::with_capacity(24);
        let groups = [
            (BASE_EDGES, colors.base),
            (PILLAR_EDGES, colors.pillars),
            (CAP_EDGES, colors.cap),
        ];
        // Edge groups do not share vertices so each group keeps its own color.
        for (edges, color) in groups {
            for [a, b] in edges {
                positions.push(corners[a as usize]);
                positions.push(corners[b as usize]);
                vertex_colors.push(color);
                vertex_colors.push(color);
            }
        }
        let indices = (0..positions.len() as u32).collect();
        Self {
            positions,
            colors: vertex_colors,
            indices: Some(indices),
            topology: Topology::Lines,
        }
    }

    /// Builds the six faces of a cuboid, colored by whether each face turns
    /// toward the camera at `pose`. Back faces come first in the index buffer.
    #[must_use]
    pub fn cuboid_solid(cuboid: &Cuboid, colors: &FaceColors, pose: &CameraPose) -> Self {
        let corners = cuboid.corners();
        let mut faces: Vec<(FaceSet, [Vec3; 4])> = FACES
            .iter()
            .map(|quad| {
                let q = quad.map(|i| corners[i]);
                let normal = (q[1] - q[0]).cross(q[2] - q[0]).normalize_or_zero();
                let center = (q[0] + q[1] + q[2] + q[3]) * 0.25;
                (FaceSet::classify(pose, normal, center), q)
            })
            .collect();
        faces.sort_by_key(|(set, _)| *set == FaceSet::Front);

        let mut positions = Vec::with_capacity(24);
        let mut vertex_colors = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (set, quad) in faces {
            let base = positions.len() as u32;
            positions.extend_from_slice(&quad);
            vertex_colors.extend(std::iter::repeat(colors.color(set)).take(4));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            positions,
            colors: vertex_colors,
            indices: Some(indices),
            topology: Topology::Triangles,
        }
    }

    /// Returns the vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the per-vertex colors.
    #[must_use]
    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Returns the index buffer, if any.
    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Returns the topology.
    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of vertices (or indices, when indexed) a draw call covers.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.indices
            .as_ref()
            .map_or(self.positions.len(), Vec::len) as u32
    }

    /// Returns the nearest and farthest camera-space depth over all vertices
    /// at `pose`.
    #[must_use]
    pub fn camera_depth_bounds(&self, pose: &CameraPose) -> (f32, f32) {
        self.positions
            .iter()
            .map(|p| pose.transform_point(*p).z)
            .fold(
                (f32::INFINITY, f32::NEG_INFINITY),
                |(near, far), z| (near.min(z), far.max(z)),
            )
    }
}

/// Supplies the overlay mesh for a calibrated pose.
pub trait OverlaySource {
    /// Builds the mesh. Called once when the scene is prepared.
    fn geometry(&self, pose: &CameraPose) -> Result<OverlayGeometry>;
}

impl OverlaySource for OverlayGeometry {
    fn geometry(&self, _pose: &CameraPose) -> Result<OverlayGeometry> {
        Ok(self.clone())
    }
}

/// The cuboid overlay in either style.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CuboidOverlay {
    /// Box placement on the board.
    pub cuboid: Cuboid,
    /// Wireframe or solid.
    pub style: OverlayStyle,
    /// Wireframe colors.
    pub edge_colors: EdgeColors,
    /// Solid colors.
    pub face_colors: FaceColors,
}

impl OverlaySource for CuboidOverlay {
    fn geometry(&self, pose: &CameraPose) -> Result<OverlayGeometry> {
        Ok(match self.style {
            OverlayStyle::Wireframe => {
                OverlayGeometry::cuboid_wireframe(&self.cuboid, &self.edge_colors)
            }
            OverlayStyle::Solid => {
                OverlayGeometry::cuboid_solid(&self.cuboid, &self.face_colors, pose)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Cuboid {
        Cuboid::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_corners_rise_toward_negative_z() {
        let corners = Cuboid::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 4.0, 5.0)).corners();
        assert_eq!(corners[0], Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(corners[2], Vec3::new(4.0, 6.0, 0.0));
        assert_eq!(corners[6], Vec3::new(4.0, 6.0, -5.0));
    }

    #[test]
    fn test_face_winding_points_outward() {
        let corners = unit_cube().corners();
        let centroid = Vec3::new(0.5, 0.5, -0.5);
        for quad in FACES {
            let q = quad.map(|i| corners[i]);
            let normal = (q[1] - q[0]).cross(q[2] - q[0]);
            let center = (q[0] + q[1] + q[2] + q[3]) * 0.25;
            assert!(normal.dot(center - centroid) > 0.0, "{quad:?} faces inward");
        }
    }

    #[test]
    fn test_wireframe_layout() {
        let colors = EdgeColors::default();
        let wire = OverlayGeometry::cuboid_wireframe(&unit_cube(), &colors);
        assert_eq!(wire.topology(), Topology::Lines);
        assert_eq!(wire.positions().len(), 24);
        assert_eq!(wire.draw_count(), 24);
        assert_eq!(wire.colors()[0], colors.base);
        assert_eq!(wire.colors()[8], colors.pillars);
        assert_eq!(wire.colors()[23], colors.cap);
    }

    #[test]
    fn test_solid_classifies_faces_for_frontal_view() {
        // Camera looking straight at the board from 10 units away: only the
        // cap (normal -Z, toward the camera) faces it head-on.
        let pose = CameraPose::new(glam::Mat3::IDENTITY, Vec3::new(-0.5, -0.5, 10.0));
        let colors = FaceColors::default();
        let solid = OverlayGeometry::cuboid_solid(&unit_cube(), &colors, &pose);
        assert_eq!(solid.topology(), Topology::Triangles);
        assert_eq!(solid.positions().len(), 24);
        assert_eq!(solid.draw_count(), 36);

        let front = solid
            .colors()
            .iter()
            .filter(|c| **c == colors.front)
            .count();
        assert_eq!(front, 4);
        // Back faces are drawn first.
        assert_eq!(solid.colors()[0], colors.back);
        assert_eq!(*solid.colors().last().unwrap(), colors.front);
    }

    #[test]
    fn test_solid_oblique_view_shows_three_faces() {
        // Camera off to the -X, -Y side sees the cap and two side faces.
        let pose = CameraPose::new(glam::Mat3::IDENTITY, Vec3::new(3.0, 3.0, 10.0));
        let colors = FaceColors::default();
        let solid = OverlayGeometry::cuboid_solid(&unit_cube(), &colors, &pose);
        let front = solid
            .colors()
            .iter()
            .filter(|c| **c == colors.front)
            .count();
        assert_eq!(front, 12);
    }

    #[test]
    fn test_new_validates_inputs() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let colors = vec![Vec4::ONE; 3];
        let triangles = Topology::Triangles;
        let valid = OverlayGeometry::new(positions.clone(), colors.clone(), None, triangles);
        assert!(valid.is_ok());
        assert!(matches!(
            OverlayGeometry::new(positions.clone(), vec![Vec4::ONE; 2], None, triangles),
            Err(CamregError::SizeMismatch { .. })
        ));
        let bad_indices = Some(vec![0, 1, 3]);
        assert!(matches!(
            OverlayGeometry::new(positions.clone(), colors.clone(), bad_indices, triangles),
            Err(CamregError::InvalidGeometry(_))
        ));
        assert!(matches!(
            OverlayGeometry::new(positions, colors, None, Topology::Lines),
            Err(CamregError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_camera_depth_bounds() {
        let wire = OverlayGeometry::cuboid_wireframe(&unit_cube(), &EdgeColors::default());
        let pose = CameraPose::new(glam::Mat3::IDENTITY, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(wire.camera_depth_bounds(&pose), (3.0, 4.0));
    }
}
