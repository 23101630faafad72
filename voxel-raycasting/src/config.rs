use log::error;
use serde::{Deserialize, Serialize};

use crate::{math::Tolerances, Error, Result, Surface};

/// The configuration for voxelising scenes and querying them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VoxelConfig {
    /// The input files.
    /// Can be expressions like `*.glb`
    pub input: Vec<String>,

    /// The number of octree subdivisions, i.e., the grid has `2^octree_depth` cells per axis.
    #[serde(default = "default_octree_depth")]
    pub octree_depth: u32,

    /// The distance by which the scene bounds are grown to obtain the grid bounds.
    #[serde(default = "default_padding")]
    pub padding: f32,

    #[serde(default)]
    pub tolerances: Tolerances,

    /// The number of random directions tried before a containment test gives up.
    #[serde(default = "default_max_inside_attempts")]
    pub max_inside_attempts: usize,

    /// The seed for the random directions. Drawn from the OS if not given.
    #[serde(default)]
    pub seed: Option<u64>,

    /// The surface assigned to all loaded triangles.
    #[serde(default)]
    pub surface: Surface,
}

fn default_octree_depth() -> u32 {
    5
}

fn default_padding() -> f32 {
    0.1
}

fn default_max_inside_attempts() -> usize {
    32
}

impl VoxelConfig {
    /// Reads the configuration from the provided reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the configuration from.
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self> {
        let config: VoxelConfig = serde_yaml::from_reader(reader).map_err(|e| {
            error!("Failed to parse the configuration: {:?}", e);

            Error::DeserializationError(Box::new(e))
        })?;

        Ok(config)
    }

    /// Writes the configuration to the provided writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the configuration to.
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let yaml = serde_yaml::to_string(&self).map_err(|e| {
            error!("Failed to serialize the configuration: {:?}", e);

            Error::SerializationError(Box::new(e))
        })?;

        writer.write_all(yaml.as_bytes())?;

        Ok(())
    }
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            octree_depth: default_octree_depth(),
            padding: default_padding(),
            tolerances: Tolerances::default(),
            max_inside_attempts: default_max_inside_attempts(),
            seed: None,
            surface: Surface::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_loading_config() {
        let config_data = include_bytes!("../../demos/configs/room.yaml");
        let config = VoxelConfig::read(&config_data[..]).unwrap();

        assert_eq!(config.input, vec!["test_data/*.off".to_string()]);
        assert_eq!(config.octree_depth, 4);
        assert_eq!(config.padding, 0.05);
        assert_eq!(config.tolerances.intersection_ulp, 20);
        assert_eq!(config.tolerances.degenerate_ulp, 10);
        assert_eq!(config.max_inside_attempts, 32);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.surface, Surface::uniform(0.2, 0.1));
    }

    #[test]
    fn test_defaults() {
        let config = VoxelConfig::read("input: [room.glb]".as_bytes()).unwrap();

        assert_eq!(
            config,
            VoxelConfig {
                input: vec!["room.glb".to_string()],
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_write_and_read() {
        let config = VoxelConfig {
            input: vec!["a.glb".to_string(), "b/*.off".to_string()],
            seed: Some(7),
            ..Default::default()
        };

        let mut buffer = Vec::new();
        config.write(&mut buffer).unwrap();

        assert_eq!(VoxelConfig::read(&buffer[..]).unwrap(), config);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            VoxelConfig::read("octree_depth: [".as_bytes()),
            Err(Error::DeserializationError(_))
        ));
    }
}
