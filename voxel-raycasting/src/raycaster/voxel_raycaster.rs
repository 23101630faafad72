use std::ops::ControlFlow;

use log::{debug, error, info, warn};
use nalgebra_glm::Vec3;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    math::{ray_triangle_intersection, triangle_box_overlap, Ray, Tolerances, AABB},
    spatial::{layout, traverse, FlattenedVoxels, VoxelGrid, VoxelStorage},
    utils::random_direction,
    DegenerateHit, Error, Result, Scene, Surface, VoxelConfig,
};

use super::{closer, Intersection};

/// Finds the nearest triangle hit by the ray. The voxels are visited in order of distance, and the
/// search stops in the first voxel whose exit lies behind the best hit found so far.
///
/// # Arguments
/// * `storage` - The voxel grid built over the scene.
/// * `scene` - The scene the grid was built over.
/// * `ray` - The ray to cast.
/// * `ignore` - Optionally, a triangle that is skipped, e.g., the one the ray starts on.
/// * `ulp` - The tolerance of the ray/triangle test.
pub fn nearest_hit<V, S>(
    storage: &V,
    scene: &Scene<S>,
    ray: &Ray,
    ignore: Option<u32>,
    ulp: u32,
) -> Option<Intersection>
where
    V: VoxelStorage + ?Sized,
{
    let mut best: Option<Intersection> = None;

    traverse(storage, ray, |ray, triangles, span| {
        for i in triangles.iter().copied() {
            if Some(i) == ignore {
                continue;
            }

            if let Some(hit) = ray_triangle_intersection(&scene.triangle_vec3(i as usize), ray, ulp) {
                best = closer(best, Intersection { triangle: i, hit });
            }
        }

        match best {
            Some(b) if b.t() <= span.exit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    best
}

/// Counts the triangles crossed by the ray. Each hit is counted in the voxel that contains it, so
/// triangles spanning several voxels are counted once. Fails if any hit lies on an edge or vertex
/// of a triangle, since the count cannot be trusted then.
///
/// # Arguments
/// * `storage` - The voxel grid built over the scene.
/// * `scene` - The scene the grid was built over.
/// * `ray` - The ray to cast.
/// * `tolerances` - The tolerances for the intersection and the degeneracy test.
pub fn count_intersections<V, S>(
    storage: &V,
    scene: &Scene<S>,
    ray: &Ray,
    tolerances: &Tolerances,
) -> std::result::Result<usize, DegenerateHit>
where
    V: VoxelStorage + ?Sized,
{
    let mut count = 0;
    let mut degenerate = false;

    traverse(storage, ray, |ray, triangles, span| {
        for i in triangles.iter() {
            let triangle = scene.triangle_vec3(*i as usize);
            let hit = match ray_triangle_intersection(&triangle, ray, tolerances.intersection_ulp) {
                Some(hit) => hit,
                None => continue,
            };

            if hit.is_degenerate(tolerances.degenerate_ulp) {
                degenerate = true;
                return ControlFlow::Break(());
            }

            if span.entry < hit.t && hit.t <= span.exit {
                count += 1;
            }
        }

        ControlFlow::Continue(())
    });

    if degenerate {
        Err(DegenerateHit)
    } else {
        Ok(count)
    }
}

/// A scene together with the voxel grid built over it. The geometry is fixed, only the surfaces
/// can be replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelisedScene<S = Surface> {
    scene: Scene<S>,
    grid: VoxelGrid,
    tolerances: Tolerances,
    max_inside_attempts: usize,
}

impl<S> VoxelisedScene<S> {
    /// The default number of random directions tried by [`VoxelisedScene::is_inside`].
    pub const DEFAULT_MAX_INSIDE_ATTEMPTS: usize = 32;

    /// Voxelises the scene with the default tolerances.
    ///
    /// # Arguments
    /// * `scene` - The scene to voxelise.
    /// * `depth` - The number of octree subdivisions.
    /// * `bounds` - The volume covered by the grid. Must differ from the scene bounds.
    pub fn new(scene: Scene<S>, depth: u32, bounds: AABB) -> Result<Self> {
        Self::build(scene, depth, bounds, Tolerances::default())
    }

    /// Voxelises the scene over its bounding box grown by the given padding.
    ///
    /// # Arguments
    /// * `scene` - The scene to voxelise.
    /// * `depth` - The number of octree subdivisions.
    /// * `padding` - The distance by which the scene bounds are grown.
    pub fn with_padding(scene: Scene<S>, depth: u32, padding: f32) -> Result<Self> {
        let bounds = scene.aabb().padded(padding);
        Self::new(scene, depth, bounds)
    }

    /// Voxelises the scene with the depth, padding and tolerances of the configuration.
    ///
    /// # Arguments
    /// * `scene` - The scene to voxelise.
    /// * `config` - The configuration to take the parameters from.
    pub fn from_config(scene: Scene<S>, config: &VoxelConfig) -> Result<Self> {
        let bounds = scene.aabb().padded(config.padding);
        let mut voxelised = Self::build(scene, config.octree_depth, bounds, config.tolerances)?;
        voxelised.max_inside_attempts = config.max_inside_attempts;

        Ok(voxelised)
    }

    /// Voxelises the scene. A triangle is sorted into every voxel it overlaps after the voxel has
    /// been grown by the overlap padding of the tolerances.
    ///
    /// # Arguments
    /// * `scene` - The scene to voxelise.
    /// * `depth` - The number of octree subdivisions.
    /// * `bounds` - The volume covered by the grid. Must differ from the scene bounds.
    /// * `tolerances` - The tolerances used for building and querying.
    pub fn build(scene: Scene<S>, depth: u32, bounds: AABB, tolerances: Tolerances) -> Result<Self> {
        if depth > layout::MAX_DEPTH {
            error!(
                "Octree depth {} exceeds the maximum of {}",
                depth,
                layout::MAX_DEPTH
            );
            return Err(Error::InvalidOctreeDepth {
                depth,
                max: layout::MAX_DEPTH,
            });
        }

        if bounds == scene.aabb() {
            error!(
                "Voxelisation bounds {} equal the scene bounds, they must be padded",
                bounds
            );
            return Err(Error::DegenerateVoxelisation);
        }

        info!(
            "Voxelising {} triangles with depth {} in {}",
            scene.triangles().len(),
            depth,
            bounds
        );

        let padding = tolerances.overlap_padding;
        let grid = VoxelGrid::build(
            &scene.triangle_indices(),
            |i, voxel| triangle_box_overlap(&scene.triangle_vec3(i as usize), &voxel.padded(padding)),
            bounds,
            depth,
        );

        Ok(Self {
            scene,
            grid,
            tolerances,
            max_inside_attempts: Self::DEFAULT_MAX_INSIDE_ATTEMPTS,
        })
    }

    #[inline]
    pub fn scene(&self) -> &Scene<S> {
        &self.scene
    }

    #[inline]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    #[inline]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Sets the number of random directions tried by [`VoxelisedScene::is_inside`].
    pub fn set_max_inside_attempts(&mut self, attempts: usize) {
        self.max_inside_attempts = attempts;
    }

    /// Replaces all surfaces of the scene. Fails without modifying anything if the number of
    /// surfaces differs.
    ///
    /// # Arguments
    /// * `surfaces` - The new surfaces.
    pub fn set_surfaces(&mut self, surfaces: Vec<S>) -> Result<()> {
        self.scene.set_surfaces(surfaces)
    }

    /// Returns the grid in the flattened device layout.
    pub fn flatten(&self) -> FlattenedVoxels {
        self.grid.flatten()
    }

    /// Finds the nearest triangle hit by the ray.
    ///
    /// # Arguments
    /// * `ray` - The ray to cast.
    /// * `ignore` - Optionally, a triangle that is skipped, e.g., the one the ray starts on.
    pub fn nearest_hit(&self, ray: &Ray, ignore: Option<u32>) -> Option<Intersection> {
        nearest_hit(
            &self.grid,
            &self.scene,
            ray,
            ignore,
            self.tolerances.intersection_ulp,
        )
    }

    /// Counts the triangles crossed by the ray.
    ///
    /// # Arguments
    /// * `ray` - The ray to cast.
    pub fn count_intersections(&self, ray: &Ray) -> std::result::Result<usize, DegenerateHit> {
        count_intersections(&self.grid, &self.scene, ray, &self.tolerances)
    }

    /// Tests whether the point lies inside the closed scene by counting the crossings along a
    /// random direction, where an odd count means inside. Directions that graze an edge or vertex
    /// are discarded and a new one is drawn.
    ///
    /// # Arguments
    /// * `point` - The point to test.
    /// * `rng` - The source of the random directions.
    pub fn is_inside<R: Rng>(&self, point: &Vec3, rng: &mut R) -> Result<bool> {
        for attempt in 0..self.max_inside_attempts {
            let ray = Ray::new(*point, random_direction(rng));

            match self.count_intersections(&ray) {
                Ok(count) => return Ok(count % 2 == 1),
                Err(DegenerateHit) => warn!(
                    "Degenerate containment test at {:?} in attempt {}, retrying",
                    point, attempt
                ),
            }
        }

        error!(
            "Containment test at {:?} stayed degenerate for {} directions",
            point, self.max_inside_attempts
        );
        Err(Error::PersistentDegeneracy {
            attempts: self.max_inside_attempts,
        })
    }

    /// Returns true if no triangle lies between begin and point.
    ///
    /// # Arguments
    /// * `begin` - The start of the path, e.g., an image source.
    /// * `point` - The end of the path.
    /// * `ignore` - Optionally, a triangle that is skipped, e.g., the one begin lies on.
    pub fn is_visible(&self, begin: &Vec3, point: &Vec3, ignore: Option<u32>) -> bool {
        let distance = (point - begin).norm();
        if distance == 0f32 {
            return true;
        }

        let ray = Ray::from_pos(begin, point);
        match self.nearest_hit(&ray, ignore) {
            Some(hit) => distance < hit.t(),
            None => true,
        }
    }
}

impl<S: Serialize> VoxelisedScene<S> {
    /// Writes the scene and its grid to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the data to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }
}

impl<S: DeserializeOwned> VoxelisedScene<S> {
    /// Reads a scene and its grid from the given reader. The scene invariant and the grid
    /// references are validated again, since the data might not have been written by this crate.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the data from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut voxelised: Self = bincode::deserialize_from(reader)
            .map_err(|e| Error::DeserializationError(Box::new(e)))?;

        voxelised.scene = voxelised.scene.revalidate().map_err(|err| {
            error!("Read voxelised scene is invalid: {}", err);
            Error::DeserializationError(format!("Invalid scene: {}", err).into())
        })?;

        if let Err(err) = voxelised.grid.validate(voxelised.scene.triangles().len()) {
            error!("Read voxel grid is invalid: {}", err);
            return Err(err);
        }

        debug!(
            "Read voxelised scene with {} triangles and {}^3 voxels",
            voxelised.scene.triangles().len(),
            voxelised.grid.side()
        );

        Ok(voxelised)
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use crate::raycaster::brute_force_nearest_hit;

    use super::*;

    fn cube() -> VoxelisedScene {
        let scene = Scene::from_box(
            &AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(4.0, 3.0, 6.0)),
            Surface::default(),
        );

        VoxelisedScene::with_padding(scene, 3, 0.1).unwrap()
    }

    #[test]
    fn test_unpadded_bounds() {
        let scene = Scene::from_box(
            &AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(1.0, 1.0, 1.0)),
            Surface::default(),
        );

        assert!(matches!(
            VoxelisedScene::with_padding(scene, 2, 0.0),
            Err(Error::DegenerateVoxelisation)
        ));
    }

    #[test]
    fn test_nearest_hit_cube() {
        let cube = cube();

        let ray = Ray::new(Vec3::new(1.0, 2.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = cube.nearest_hit(&ray, None).unwrap();
        assert_eq!(hit.t(), 3.0);

        // the hit triangle is part of the x=4 wall
        let triangle = cube.scene().triangle_vec3(hit.triangle as usize);
        assert!(triangle.0.iter().all(|p| p.x == 4.0));

        let device = nearest_hit(&cube.flatten(), cube.scene(), &ray, None, 10);
        assert_eq!(device, Some(hit));
        assert!(cube.nearest_hit(&ray, Some(hit.triangle)).is_none());
    }

    #[test]
    fn test_count_intersections() {
        let cube = cube();

        let ray = Ray::new(Vec3::new(-1.0, 1.0, 3.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(cube.count_intersections(&ray), Ok(2));

        let ray = Ray::new(Vec3::new(-1.0, 1.0, 3.0), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(cube.count_intersections(&ray), Ok(0));

        // through the diagonal of the x=0 wall
        let ray = Ray::new(Vec3::new(-1.0, 1.5, 3.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(cube.count_intersections(&ray), Err(DegenerateHit));

        let flat = cube.flatten();
        let ray = Ray::new(Vec3::new(2.0, 1.0, 1.0), Vec3::new(1.0, 0.3, 0.7));
        assert_eq!(
            count_intersections(&flat, cube.scene(), &ray, cube.tolerances()),
            cube.count_intersections(&ray)
        );
    }

    #[test]
    fn test_is_inside() {
        let cube = cube();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        assert!(cube.is_inside(&Vec3::new(2.0, 1.5, 3.0), &mut rng).unwrap());
        assert!(!cube
            .is_inside(&Vec3::new(100.0, 100.0, 100.0), &mut rng)
            .unwrap());

        // repeated tests must agree regardless of the drawn directions
        for _ in 0..50 {
            let p = Vec3::new(
                rng.random_range(0.2..3.8),
                rng.random_range(0.2..2.8),
                rng.random_range(0.2..5.8),
            );
            assert!(cube.is_inside(&p, &mut rng).unwrap());

            let q = p + Vec3::new(5.0, 0.0, 0.0);
            assert!(!cube.is_inside(&q, &mut rng).unwrap());
        }
    }

    #[test]
    fn test_persistent_degeneracy() {
        let mut cube = cube();
        cube.set_max_inside_attempts(0);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(matches!(
            cube.is_inside(&Vec3::new(2.0, 1.5, 3.0), &mut rng),
            Err(Error::PersistentDegeneracy { attempts: 0 })
        ));
    }

    #[test]
    fn test_is_visible() {
        let cube = cube();
        let inside = Vec3::new(1.0, 1.0, 1.0);

        assert!(cube.is_visible(&inside, &Vec3::new(3.0, 2.0, 5.0), None));
        assert!(!cube.is_visible(&inside, &Vec3::new(10.0, 1.0, 1.0), None));

        // an image source behind the x=0 wall sees points inside through the wall it was
        // mirrored on
        let image = Vec3::new(-1.0, 1.0, 3.0);
        let target = Vec3::new(1.0, 1.0, 2.0);
        let hit = cube
            .nearest_hit(&Ray::from_pos(&image, &target), None)
            .unwrap();
        assert!(!cube.is_visible(&image, &target, None));
        assert!(cube.is_visible(&image, &target, Some(hit.triangle)));
    }

    /// The voxel accelerated search must agree with testing all triangles.
    #[test]
    fn test_agrees_with_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let bounds = AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(5.0, 5.0, 5.0));

        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for i in 0..300u32 {
            let p = Vec3::new(
                rng.random_range(0.0..5.0),
                rng.random_range(0.0..5.0),
                rng.random_range(0.0..5.0),
            );
            vertices.push(p);
            vertices.push(p + random_direction(&mut rng) * 0.8);
            vertices.push(p + random_direction(&mut rng) * 0.8);
            triangles.push(crate::Triangle::new(0, 3 * i, 3 * i + 1, 3 * i + 2));
        }

        let scene = Scene::build(triangles, vertices, vec![Surface::default()]).unwrap();
        let voxelised = VoxelisedScene::build(
            scene,
            4,
            bounds.padded(1.0),
            Tolerances::default(),
        )
        .unwrap();
        let flat = voxelised.flatten();

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.random_range(-1.0..6.0),
                rng.random_range(-1.0..6.0),
                rng.random_range(-1.0..6.0),
            );
            let ray = Ray::new(origin, random_direction(&mut rng));

            let expected = brute_force_nearest_hit(voxelised.scene(), &ray, None, 10);
            let actual = voxelised.nearest_hit(&ray, None);
            let device = nearest_hit(&flat, voxelised.scene(), &ray, None, 10);

            assert_eq!(actual, device);
            match (expected, actual) {
                (Some(e), Some(a)) => assert!((e.t() - a.t()).abs() < 1e-5),
                (None, None) => {}
                _ => panic!("brute force {:?} and voxels {:?} disagree", expected, actual),
            }
        }
    }

    #[test]
    fn test_serialize_and_deserialize() {
        let mut cube = cube();
        cube.set_surfaces(vec![Surface::uniform(0.3, 0.5)]).unwrap();

        let mut buffer = Vec::new();
        cube.write(&mut buffer).unwrap();

        let cube2: VoxelisedScene = VoxelisedScene::read_from(&buffer[..]).unwrap();
        assert_eq!(cube, cube2);
        assert_eq!(cube2.scene().surface_of(0), &Surface::uniform(0.3, 0.5));
    }

    #[test]
    fn test_reject_corrupt_scene() {
        let cube = cube();

        let mut buffer = Vec::new();
        cube.write(&mut buffer).unwrap();

        // the triangle vector starts with its length, followed by the surface and v0 of the
        // first triangle
        buffer[12..16].copy_from_slice(&1000u32.to_le_bytes());

        assert!(matches!(
            VoxelisedScene::<Surface>::read_from(&buffer[..]),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_reject_grid_of_other_scene() {
        let cube = cube();
        let empty = VoxelisedScene {
            scene: Scene::build(Vec::new(), Vec::new(), vec![Surface::default()]).unwrap(),
            grid: cube.grid.clone(),
            tolerances: cube.tolerances,
            max_inside_attempts: cube.max_inside_attempts,
        };

        let mut buffer = Vec::new();
        empty.write(&mut buffer).unwrap();

        assert!(matches!(
            VoxelisedScene::<Surface>::read_from(&buffer[..]),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let scene = Scene::from_box(
            &AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(1.0, 1.0, 1.0)),
            Surface::default(),
        );

        for depth in [layout::MAX_DEPTH + 1, 64] {
            assert!(matches!(
                VoxelisedScene::with_padding(scene.clone(), depth, 0.1),
                Err(Error::InvalidOctreeDepth { .. })
            ));
        }

        let config = VoxelConfig {
            octree_depth: 40,
            ..Default::default()
        };
        assert!(VoxelisedScene::from_config(scene, &config).is_err());
    }
}
