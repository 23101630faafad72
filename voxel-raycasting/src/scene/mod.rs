mod io;
mod io_utils;
mod surface;

pub use io::*;
pub use surface::*;

use log::error;
use nalgebra_glm::Vec3;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    math::{TriangleVec3, AABB},
    Error, IndexKind, Result,
};

/// A triangle of the scene, given by three vertex indices and the index of its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Triangle {
    pub surface: u32,
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

impl Triangle {
    pub fn new(surface: u32, v0: u32, v1: u32, v2: u32) -> Self {
        Self {
            surface,
            v0,
            v1,
            v2,
        }
    }

    /// Returns the three vertex indices.
    #[inline]
    pub fn vertices(&self) -> [u32; 3] {
        [self.v0, self.v1, self.v2]
    }
}

/// A triangulated scene with one surface per triangle.
///
/// Invariant: every triangle references valid vertices and a valid surface. The invariant is
/// checked once in [`Scene::build`] and relied upon by every query afterwards. The geometry can
/// never change after construction, only the surfaces can be swapped for the same number of new
/// ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene<S = Surface> {
    triangles: Vec<Triangle>,
    vertices: Vec<Vec3>,
    surfaces: Vec<S>,
}

impl<S> Scene<S> {
    /// Creates a new scene and checks that all triangle indices are in range.
    ///
    /// # Arguments
    /// * `triangles` - The triangles of the scene.
    /// * `vertices` - The vertex positions referenced by the triangles.
    /// * `surfaces` - The surfaces referenced by the triangles.
    pub fn build(triangles: Vec<Triangle>, vertices: Vec<Vec3>, surfaces: Vec<S>) -> Result<Self> {
        for (i, t) in triangles.iter().enumerate() {
            for v in t.vertices() {
                Self::check_index(i, IndexKind::Vertex, v, vertices.len())?;
            }

            Self::check_index(i, IndexKind::Surface, t.surface, surfaces.len())?;
        }

        Ok(Self {
            triangles,
            vertices,
            surfaces,
        })
    }

    /// Checks the invariant again for a scene that did not come from [`Scene::build`].
    pub(crate) fn revalidate(self) -> Result<Self> {
        Self::build(self.triangles, self.vertices, self.surfaces)
    }

    fn check_index(triangle: usize, kind: IndexKind, index: u32, len: usize) -> Result<()> {
        if (index as usize) < len {
            Ok(())
        } else {
            error!(
                "Triangle {} references {} {}, but there are only {}",
                triangle, kind, index, len
            );

            Err(Error::IndexOutOfRange {
                triangle,
                kind,
                index,
                len,
            })
        }
    }

    /// Returns a copy of the scene with all surfaces replaced. Fails if the number of surfaces
    /// differs from the current one, in which case this scene stays as it is.
    ///
    /// # Arguments
    /// * `surfaces` - The new surfaces.
    pub fn with_surfaces(&self, surfaces: Vec<S>) -> Result<Self> {
        self.check_surface_count(surfaces.len())?;

        Ok(Self {
            triangles: self.triangles.clone(),
            vertices: self.vertices.clone(),
            surfaces,
        })
    }

    /// Replaces all surfaces in place. Fails without modifying anything if the number of surfaces
    /// differs from the current one.
    ///
    /// # Arguments
    /// * `surfaces` - The new surfaces.
    pub fn set_surfaces(&mut self, surfaces: Vec<S>) -> Result<()> {
        self.check_surface_count(surfaces.len())?;
        self.surfaces = surfaces;

        Ok(())
    }

    fn check_surface_count(&self, actual: usize) -> Result<()> {
        let expected = self.surfaces.len();
        if expected == actual {
            Ok(())
        } else {
            error!("Expected {} surfaces, got {}", expected, actual);
            Err(Error::MaterialCountMismatch { expected, actual })
        }
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn surfaces(&self) -> &[S] {
        &self.surfaces
    }

    /// Returns the surface of the triangle with the given index.
    ///
    /// # Arguments
    /// * `triangle` - The index of the triangle.
    #[inline]
    pub fn surface_of(&self, triangle: usize) -> &S {
        &self.surfaces[self.triangles[triangle].surface as usize]
    }

    /// Resolves the triangle with the given index to its vertex positions.
    ///
    /// # Arguments
    /// * `triangle` - The index of the triangle.
    #[inline]
    pub fn triangle_vec3(&self, triangle: usize) -> TriangleVec3 {
        let t = &self.triangles[triangle];
        TriangleVec3::new(
            self.vertices[t.v0 as usize],
            self.vertices[t.v1 as usize],
            self.vertices[t.v2 as usize],
        )
    }

    /// Returns the tight bounding box around all vertices.
    pub fn aabb(&self) -> AABB {
        AABB::from_iter(self.vertices.iter().copied())
    }

    /// Returns the indices of all triangles.
    pub fn triangle_indices(&self) -> Vec<u32> {
        (0..self.triangles.len() as u32).collect()
    }
}

impl<S: Clone> Scene<S> {
    /// Creates the closed box with 12 triangles that all use the given surface.
    ///
    /// # Arguments
    /// * `aabb` - The box to triangulate.
    /// * `surface` - The surface used for all walls.
    pub fn from_box(aabb: &AABB, surface: S) -> Self {
        let (lo, hi) = (aabb.min, aabb.max);
        let vertices = vec![
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];

        let triangles = [
            [0, 1, 5],
            [0, 5, 4],
            [1, 0, 3],
            [0, 2, 3],
            [2, 0, 6],
            [0, 4, 6],
            [5, 1, 7],
            [1, 3, 7],
            [3, 2, 7],
            [2, 6, 7],
            [4, 5, 7],
            [6, 4, 7],
        ]
        .iter()
        .map(|[v0, v1, v2]| Triangle::new(0, *v0, *v1, *v2))
        .collect();

        Self {
            triangles,
            vertices,
            surfaces: vec![surface],
        }
    }
}

impl<S: Serialize> Scene<S> {
    /// Writes the scene to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the scene to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }
}

impl<S: DeserializeOwned> Scene<S> {
    /// Reads the scene from the given reader. The triangle indices are validated again, since the
    /// data might not have been written by this crate.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the scene from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let scene: Self = bincode::deserialize_from(reader)
            .map_err(|e| Error::DeserializationError(Box::new(e)))?;

        scene.revalidate()
    }
}

impl<S> Default for Scene<S> {
    fn default() -> Self {
        Self {
            triangles: Vec::new(),
            vertices: Vec::new(),
            surfaces: Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn box_scene() -> Scene {
        Scene::from_box(
            &AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(4.0, 3.0, 6.0)),
            Surface::default(),
        )
    }

    #[test]
    fn test_build_checks_indices() {
        let vertices = vec![Vec3::zeros(), Vec3::x(), Vec3::y()];

        let scene = Scene::build(
            vec![Triangle::new(0, 0, 1, 2)],
            vertices.clone(),
            vec![Surface::default()],
        );
        assert!(scene.is_ok());

        let scene = Scene::build(
            vec![Triangle::new(0, 0, 1, 2), Triangle::new(0, 0, 3, 2)],
            vertices.clone(),
            vec![Surface::default()],
        );
        assert!(matches!(
            scene,
            Err(Error::IndexOutOfRange {
                triangle: 1,
                kind: IndexKind::Vertex,
                index: 3,
                len: 3
            })
        ));

        let scene = Scene::build(
            vec![Triangle::new(1, 0, 1, 2)],
            vertices,
            vec![Surface::default()],
        );
        assert!(matches!(
            scene,
            Err(Error::IndexOutOfRange {
                kind: IndexKind::Surface,
                ..
            })
        ));
    }

    #[test]
    fn test_replace_surfaces() {
        let mut scene = box_scene();
        let absorbing = Surface::uniform(0.5, 0.1);

        let replaced = scene.with_surfaces(vec![absorbing]).unwrap();
        assert_eq!(replaced.surfaces(), &[absorbing]);
        assert_eq!(replaced.triangles(), scene.triangles());
        assert_eq!(scene.surfaces(), &[Surface::default()]);

        let err = scene.with_surfaces(vec![absorbing, absorbing]);
        assert!(matches!(
            err,
            Err(Error::MaterialCountMismatch {
                expected: 1,
                actual: 2
            })
        ));

        assert!(scene.set_surfaces(vec![]).is_err());
        assert_eq!(scene.surfaces(), &[Surface::default()]);

        scene.set_surfaces(vec![absorbing]).unwrap();
        assert_eq!(scene.surface_of(11), &absorbing);
    }

    #[test]
    fn test_box_scene() {
        let scene = box_scene();

        assert_eq!(scene.triangles().len(), 12);
        assert_eq!(scene.vertices().len(), 8);
        assert_eq!(
            scene.aabb(),
            AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(4.0, 3.0, 6.0))
        );

        // every wall lies in one of the six planes of the box
        for i in 0..scene.triangles().len() {
            let t = scene.triangle_vec3(i);
            let on_plane = (0..3).any(|axis| {
                (t[0][axis] == t[1][axis] && t[1][axis] == t[2][axis])
                    && (t[0][axis] == 0.0 || t[0][axis] == scene.aabb().max[axis])
            });
            assert!(on_plane, "triangle {} is not a wall", i);
        }
    }

    #[test]
    fn test_serialize_and_deserialize_scene() {
        let scene = box_scene();

        let mut buffer = Vec::new();
        scene.write(&mut buffer).unwrap();

        let scene2: Scene = Scene::read_from(&buffer[..]).unwrap();
        assert_eq!(scene, scene2);
    }
}
