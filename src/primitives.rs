//! CPU-side geometry for the built-in shapes.
//!
//! Every shape is generated once, on the CPU, as a [`Geometry`] of
//! [`Vertex3d`]s and `u32` indices. Uploading is the render backend's job (see
//! [`Mesh`](crate::mesh::Mesh)); nothing here touches the GPU.
//!
//! | Shape | Extent | Winding |
//! |-------|--------|---------|
//! | [`ShapeKind::Cube`] | unit cube centred at the origin | CCW, outward |
//! | [`ShapeKind::Quad`] | unit square in the XY plane, facing +Z | CCW |
//! | [`ShapeKind::LetterF`] | an extruded "F", one unit tall | CCW, outward |
//! | [`ShapeKind::Skybox`] | unit cube | CCW, inward |

use glam::Vec3;

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` and [`bytemuck::Pod`] so vertex slices can be uploaded as-is.
/// Each vertex occupies 32 bytes: position at 0, normal at 12, uv at 24.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Identifies one of the built-in shapes.
///
/// Used as the key for per-shape GPU resources, which are created the first
/// time a shape of that kind is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Cube,
    Quad,
    LetterF,
    Skybox,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Cube,
        ShapeKind::Quad,
        ShapeKind::LetterF,
        ShapeKind::Skybox,
    ];

    /// Builds this shape's geometry.
    pub fn geometry(self) -> Geometry {
        match self {
            ShapeKind::Cube => Geometry::cube(),
            ShapeKind::Quad => Geometry::quad(),
            ShapeKind::LetterF => Geometry::letter_f(),
            ShapeKind::Skybox => Geometry::skybox(),
        }
    }

    /// Debug label for GPU resources.
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Cube => "Cube",
            ShapeKind::Quad => "Quad",
            ShapeKind::LetterF => "Letter F",
            ShapeKind::Skybox => "Skybox",
        }
    }
}

/// Indexed triangle-list geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

/// Face table for axis-aligned boxes: `(normal, u, v)` with `u × v = normal`,
/// so corners emitted in `(-u,-v) (u,-v) (u,v) (-u,v)` order wind CCW when
/// seen from outside.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

impl Geometry {
    /// Unit cube centred at the origin, 24 vertices so each face has its own normal.
    pub fn cube() -> Self {
        Self::cuboid(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    /// Axis-aligned box between `min` and `max`.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let half = (max - min) * 0.5;
        let mut geometry = Self::default();

        for (normal, u, v) in BOX_FACES {
            let face_center = center + normal * half;
            let hu = u * half.dot(u.abs());
            let hv = v * half.dot(v.abs());
            let base = geometry.vertices.len() as u32;
            let corners = [
                (face_center - hu - hv, [0.0, 0.0]),
                (face_center + hu - hv, [1.0, 0.0]),
                (face_center + hu + hv, [1.0, 1.0]),
                (face_center - hu + hv, [0.0, 1.0]),
            ];
            for (position, uv) in corners {
                geometry
                    .vertices
                    .push(Vertex3d::new(position.to_array(), normal.to_array(), uv));
            }
            geometry
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        geometry
    }

    /// Unit square in the XY plane facing +Z. Scaled by 2 it covers clip space,
    /// which is how offscreen targets are presented.
    pub fn quad() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            Vertex3d::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex3d::new([ 0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// An extruded letter "F" one unit tall, roughly centred on the origin.
    pub fn letter_f() -> Self {
        let offset = Vec3::new(-1.0 / 3.0, -0.5, -0.1);
        let mut geometry = Self::cuboid(
            Vec3::new(0.0, 0.0, 0.0) + offset,
            Vec3::new(0.2, 1.0, 0.2) + offset,
        );
        geometry.append(Self::cuboid(
            Vec3::new(0.2, 0.8, 0.0) + offset,
            Vec3::new(0.667, 1.0, 0.2) + offset,
        ));
        geometry.append(Self::cuboid(
            Vec3::new(0.2, 0.4, 0.0) + offset,
            Vec3::new(0.533, 0.6, 0.2) + offset,
        ));
        geometry
    }

    /// Unit cube seen from the inside: winding reversed and normals flipped.
    pub fn skybox() -> Self {
        let mut geometry = Self::cube();
        for vertex in &mut geometry.vertices {
            vertex.normal = (-Vec3::from_array(vertex.normal)).to_array();
        }
        for triangle in geometry.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
        geometry
    }

    /// Appends `other`, rebasing its indices.
    pub fn append(&mut self, other: Geometry) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from_array(v.position);
                (min.min(p), max.max(p))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(geometry: &Geometry, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from_array(geometry.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn indices_are_in_range() {
        for kind in ShapeKind::ALL {
            let geometry = kind.geometry();
            assert_eq!(geometry.indices.len() % 3, 0, "{kind:?}");
            let count = geometry.vertices.len() as u32;
            assert!(geometry.indices.iter().all(|&i| i < count), "{kind:?}");
        }
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for tri in cube.indices.chunks_exact(3) {
            let n = triangle_normal(&cube, tri);
            let stored = Vec3::from_array(cube.vertices[tri[0] as usize].normal);
            assert!(n.dot(stored) > 0.0);
        }
        assert_eq!(cube.bounds(), (Vec3::splat(-0.5), Vec3::splat(0.5)));
    }

    #[test]
    fn skybox_faces_wind_inward() {
        let skybox = Geometry::skybox();
        for tri in skybox.indices.chunks_exact(3) {
            let n = triangle_normal(&skybox, tri);
            let centroid = Vec3::from_array(skybox.vertices[tri[0] as usize].position);
            assert!(n.dot(centroid) < 0.0);
        }
    }

    #[test]
    fn letter_f_is_three_boxes() {
        let f = Geometry::letter_f();
        assert_eq!(f.vertices.len(), 72);
        assert_eq!(f.triangle_count(), 36);
        let (min, max) = f.bounds();
        assert!((max.y - min.y - 1.0).abs() < 1e-6);
        assert!(min.y < 0.0 && max.y > 0.0);
    }

    #[test]
    fn quad_faces_plus_z() {
        let quad = Geometry::quad();
        let n = triangle_normal(&quad, &quad.indices[0..3]);
        assert!(n.normalize().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }
}
