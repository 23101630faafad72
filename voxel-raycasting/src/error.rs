use thiserror::Error;

/// The kind of array a triangle index refers into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Surface,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Vertex => write!(f, "vertex"),
            IndexKind::Surface => write!(f, "surface"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CAD import error: {0}")]
    CadImport(#[from] cad_import::Error),

    #[error("File has either no extension or an invalid extension")]
    InvalidFileExtension,

    #[error("No loader found for the given file")]
    NoLoaderFound,

    #[error("Triangle {triangle} references {kind} {index}, but there are only {len}")]
    IndexOutOfRange {
        triangle: usize,
        kind: IndexKind,
        index: u32,
        len: usize,
    },

    #[error("Expected {expected} surfaces, got {actual}")]
    MaterialCountMismatch { expected: usize, actual: usize },

    #[error("Octree depth {depth} exceeds the maximum of {max}")]
    InvalidOctreeDepth { depth: u32, max: u32 },

    #[error("The voxelisation boundary equals the scene bounds, it must be padded")]
    DegenerateVoxelisation,

    #[error("Containment test stayed degenerate after {attempts} random directions")]
    PersistentDegeneracy { attempts: usize },

    #[error("Serialization error: {0}")]
    SerializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("Deserialization error: {0}")]
    DeserializationError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Signals that a ray passed within tolerance of a triangle edge or vertex, so
/// the number of crossings along it cannot be trusted for parity tests.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Ray grazed a triangle edge or vertex")]
pub struct DegenerateHit;
