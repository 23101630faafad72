use std::path::Path;

use cad_import::{
    loader::Manager,
    structure::{CADData, IndexData, Node, Point3D, Shape},
};
use log::{debug, error, info};
use nalgebra_glm::{Mat4, Vec3, Vec4};

use crate::{Error, Result};

use super::{io_utils::decode_triangles, Scene, Surface, Triangle};

/// Loads a scene from the given CAD file. All node transformations are applied to the vertices,
/// and every triangle is assigned the given surface.
///
/// # Arguments
/// * `path` - The path to load the scene from.
/// * `surface` - The surface assigned to all triangles.
pub fn load_scene<P: AsRef<Path>>(path: P, surface: Surface) -> Result<Scene> {
    load_scenes(std::iter::once(path), surface)
}

/// Loads the given CAD files into a single scene. Fails if any of the files cannot be loaded.
///
/// # Arguments
/// * `paths` - The paths to load the scene from.
/// * `surface` - The surface assigned to all triangles.
pub fn load_scenes<I, P>(paths: I, surface: Surface) -> Result<Scene>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut builder = SceneBuilder::default();

    for path in paths {
        let path = path.as_ref();
        let cad_data = load_cad_data(path)?;

        let num_triangles = builder.triangles.len();
        builder.add_cad_data(&cad_data);

        info!(
            "Loaded {} triangles from {:?}",
            builder.triangles.len() - num_triangles,
            path
        );
    }

    builder.build(surface)
}

/// Tries to load the cad data from the given path
///
/// # Arguments
/// * `file_path` - The path to load the CAD data from.
fn load_cad_data(file_path: &Path) -> Result<CADData> {
    let manager = Manager::new();

    let mime_types = determine_mime_types(&manager, file_path)?;

    for mime_type in mime_types.iter() {
        if let Some(loader) = manager.get_loader_by_mime_type(mime_type.as_str()) {
            let cad_data = loader
                .read_file(file_path, mime_type)
                .map_err(Error::CadImport)?;

            return Ok(cad_data);
        }
    }

    error!("Cannot find loader for the input file {:?}", file_path);
    Err(Error::NoLoaderFound)
}

/// Tries to find the mime types for the given file based on the file extension.
///
/// # Arguments
/// * `input_file` - The input file whose extension will be used
pub fn determine_mime_types(manager: &Manager, input_file: &Path) -> Result<Vec<String>> {
    match input_file.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => Ok(manager.get_mime_types_for_extension(ext)),
        None => {
            error!("Cannot determine the file extension of {:?}", input_file);
            Err(Error::InvalidFileExtension)
        }
    }
}

/// Collects world-space triangles while walking over the node structure.
#[derive(Default)]
struct SceneBuilder {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
}

impl SceneBuilder {
    fn add_cad_data(&mut self, cad_data: &CADData) {
        let root = cad_data.get_root_node();
        self.visit(root, &Mat4::identity());
    }

    /// Adds the shapes of the node and its children.
    ///
    /// # Arguments
    /// * `node` - The currently visited node.
    /// * `parent` - The accumulated transformation of the parent nodes.
    fn visit(&mut self, node: &Node, parent: &Mat4) {
        let transform = match node.get_transform() {
            Some(t) => parent * Mat4::from_column_slice(t.as_slice()),
            None => *parent,
        };

        for shape in node.get_shapes() {
            self.add_shape(shape, &transform);
        }

        for child in node.get_children().iter() {
            self.visit(child, &transform);
        }
    }

    fn add_shape(&mut self, shape: &Shape, transform: &Mat4) {
        for part in shape.get_parts() {
            let mesh = part.get_mesh();
            let positions = mesh.get_vertices().get_positions().as_slice();
            let primitives = mesh.get_primitives();
            let primitive_type = primitives.get_primitive_type();

            let triangles = match primitives.get_raw_index_data() {
                IndexData::Indices(indices) => decode_triangles(primitive_type, indices),
                IndexData::NonIndexed(n) => {
                    let indices: Vec<u32> = (0..*n as u32).collect();
                    decode_triangles(primitive_type, &indices)
                }
            };

            match triangles {
                Some(triangles) => self.append(positions, &triangles, transform),
                None => debug!("Primitive type {:?} is not triangle", primitive_type),
            }
        }
    }

    /// Appends the transformed positions and the triangles referencing them.
    fn append(&mut self, positions: &[Point3D], triangles: &[[u32; 3]], transform: &Mat4) {
        let offset = self.vertices.len() as u32;

        self.vertices.extend(positions.iter().map(|p| {
            let p = Vec3::from_row_slice(p.0.as_slice());
            (transform * Vec4::new(p.x, p.y, p.z, 1f32)).xyz()
        }));

        self.triangles.extend(
            triangles
                .iter()
                .map(|[v0, v1, v2]| Triangle::new(0, v0 + offset, v1 + offset, v2 + offset)),
        );
    }

    fn build(self, surface: Surface) -> Result<Scene> {
        Scene::build(self.triangles, self.vertices, vec![surface])
    }
}
