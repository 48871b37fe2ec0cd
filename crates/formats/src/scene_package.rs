use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::manifest::{BufferEntry, BufferLayout, MANIFEST_VERSION, SceneManifest};

pub const MANIFEST_FILE_NAME: &str = "scene.manifest.json";
pub const TERRAIN_POSITIONS_FILE: &str = "terrain_positions.bin";
pub const TERRAIN_TEXCOORDS_FILE: &str = "terrain_texcoords.bin";
pub const TRAJECTORY_POSITIONS_FILE: &str = "trajectory_positions.bin";
pub const TRAJECTORY_COLORS_FILE: &str = "trajectory_colors.bin";

#[derive(Debug, thiserror::Error)]
pub enum ScenePackageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported manifest version: {found}")]
    UnsupportedVersion { found: String },
    #[error("buffer {path} holds {found} bytes, expected {expected}")]
    BufferSize {
        path: String,
        expected: usize,
        found: usize,
    },
    #[error("buffer {path} content hash mismatch")]
    HashMismatch { path: String },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ScenePackageError + '_ {
    move |source| ScenePackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A scene package on disk, ready for a renderer to pick up.
#[derive(Debug, Clone)]
pub struct ScenePackage {
    root: PathBuf,
    manifest: SceneManifest,
}

impl ScenePackage {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ScenePackageError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        let payload = fs::read_to_string(&manifest_path).map_err(io_error(&manifest_path))?;
        let manifest: SceneManifest = serde_json::from_str(&payload)?;

        if manifest.version != MANIFEST_VERSION {
            return Err(ScenePackageError::UnsupportedVersion {
                found: manifest.version,
            });
        }

        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a buffer and check its size and content hash against the entry.
    pub fn read_buffer(&self, entry: &BufferEntry) -> Result<Vec<u8>, ScenePackageError> {
        let path = self.root.join(&entry.path);
        let bytes = fs::read(&path).map_err(io_error(&path))?;

        let expected = entry.count * entry.layout.element_size();
        if bytes.len() != expected {
            return Err(ScenePackageError::BufferSize {
                path: entry.path.clone(),
                expected,
                found: bytes.len(),
            });
        }
        if let Some(hash) = &entry.content_hash {
            if blake3::hash(&bytes).to_hex().as_str() != hash.as_str() {
                return Err(ScenePackageError::HashMismatch {
                    path: entry.path.clone(),
                });
            }
        }
        Ok(bytes)
    }
}

/// Writes buffers into a package directory; the manifest goes last.
#[derive(Debug)]
pub struct ScenePackageWriter {
    root: PathBuf,
}

impl ScenePackageWriter {
    pub fn create(root: impl AsRef<Path>) -> Result<Self, ScenePackageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(io_error(&root))?;
        Ok(Self { root })
    }

    pub fn write_f32x3(
        &self,
        file_name: &str,
        items: &[[f32; 3]],
    ) -> Result<BufferEntry, ScenePackageError> {
        let mut bytes = Vec::with_capacity(items.len() * 12);
        for v in items {
            bytes.extend_from_slice(&v[0].to_le_bytes());
            bytes.extend_from_slice(&v[1].to_le_bytes());
            bytes.extend_from_slice(&v[2].to_le_bytes());
        }
        self.write_buffer(file_name, BufferLayout::F32x3, items.len(), &bytes)
    }

    pub fn write_f32x2(
        &self,
        file_name: &str,
        items: &[[f32; 2]],
    ) -> Result<BufferEntry, ScenePackageError> {
        let mut bytes = Vec::with_capacity(items.len() * 8);
        for v in items {
            bytes.extend_from_slice(&v[0].to_le_bytes());
            bytes.extend_from_slice(&v[1].to_le_bytes());
        }
        self.write_buffer(file_name, BufferLayout::F32x2, items.len(), &bytes)
    }

    pub fn write_u8x3(
        &self,
        file_name: &str,
        items: &[[u8; 3]],
    ) -> Result<BufferEntry, ScenePackageError> {
        let bytes: Vec<u8> = items.iter().flatten().copied().collect();
        self.write_buffer(file_name, BufferLayout::U8x3, items.len(), &bytes)
    }

    fn write_buffer(
        &self,
        file_name: &str,
        layout: BufferLayout,
        count: usize,
        bytes: &[u8],
    ) -> Result<BufferEntry, ScenePackageError> {
        let path = self.root.join(file_name);
        fs::write(&path, bytes).map_err(io_error(&path))?;
        let hash = blake3::hash(bytes);
        debug!(path = %path.display(), count, "wrote buffer");
        Ok(BufferEntry {
            path: file_name.to_string(),
            layout,
            count,
            content_hash: Some(hash.to_hex().to_string()),
        })
    }

    pub fn finish(self, manifest: &SceneManifest) -> Result<PathBuf, ScenePackageError> {
        let path = self.root.join(MANIFEST_FILE_NAME);
        let payload = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, payload).map_err(io_error(&path))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{MANIFEST_FILE_NAME, ScenePackage, ScenePackageError, ScenePackageWriter};
    use crate::manifest::{
        BufferEntry, BufferLayout, MANIFEST_VERSION, SceneManifest, TerrainEntry, TrajectoryEntry,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let id = format!("glider_scene_package_{label}_{}", std::process::id());
        dir.push(id);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn manifest(positions: BufferEntry, tex: BufferEntry, colors: BufferEntry) -> SceneManifest {
        SceneManifest {
            version: MANIFEST_VERSION.to_string(),
            name: Some("Demo".to_string()),
            sphere_radius: 6_371_009.0,
            focal_point: [1.0, 2.0, 3.0],
            terrain: TerrainEntry {
                rows: 1,
                cols: 2,
                grid_window: [2, 4, 1, 2],
                overlay_image: Some("map.jpg".to_string()),
                outside_vertices: 1,
                positions: positions.clone(),
                tex_coords: tex,
            },
            trajectory: TrajectoryEntry {
                samples: 2,
                min_vertical_speed: -1.5,
                max_vertical_speed: 2.0,
                tube_radius: 20.0,
                tube_sides: 50,
                positions,
                colors,
            },
        }
    }

    #[test]
    fn write_then_load_scene_package() {
        let root = temp_dir("write");
        let writer = ScenePackageWriter::create(&root).expect("create writer");
        let positions = writer
            .write_f32x3("positions.bin", &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])
            .expect("positions");
        let tex = writer
            .write_f32x2("tex.bin", &[[0.25, 0.5], [-1.0, -1.0]])
            .expect("tex");
        let colors = writer
            .write_u8x3("colors.bin", &[[255, 0, 0], [0, 255, 0]])
            .expect("colors");
        assert_eq!(positions.layout, BufferLayout::F32x3);
        assert_eq!(positions.count, 2);

        let manifest = manifest(positions.clone(), tex.clone(), colors.clone());
        let path = writer.finish(&manifest).expect("finish");
        assert_eq!(path, root.join(MANIFEST_FILE_NAME));

        let package = ScenePackage::load(&root).expect("load package");
        assert_eq!(package.root(), root.as_path());
        assert_eq!(package.manifest(), &manifest);

        let bytes = package.read_buffer(&positions).expect("read positions");
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        let colors_bytes = package.read_buffer(&colors).expect("read colors");
        assert_eq!(colors_bytes, vec![255, 0, 0, 0, 255, 0]);
        assert_eq!(package.read_buffer(&tex).expect("read tex").len(), 16);
    }

    #[test]
    fn detects_tampered_buffer() {
        let root = temp_dir("tamper");
        let writer = ScenePackageWriter::create(&root).expect("create writer");
        let colors = writer
            .write_u8x3("colors.bin", &[[1, 2, 3]])
            .expect("colors");
        fs::write(root.join("colors.bin"), [3u8, 2, 1]).expect("tamper");

        let m = manifest(colors.clone(), colors.clone(), colors.clone());
        writer.finish(&m).expect("finish");
        let package = ScenePackage::load(&root).expect("load package");
        assert!(matches!(
            package.read_buffer(&colors),
            Err(ScenePackageError::HashMismatch { .. })
        ));

        fs::write(root.join("colors.bin"), [3u8, 2]).expect("truncate");
        assert!(matches!(
            package.read_buffer(&colors),
            Err(ScenePackageError::BufferSize {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn rejects_unsupported_manifest_version() {
        let root = temp_dir("version");
        let entry = BufferEntry {
            path: "none.bin".to_string(),
            layout: BufferLayout::U8x3,
            count: 0,
            content_hash: None,
        };
        let mut manifest = manifest(entry.clone(), entry.clone(), entry);
        manifest.version = "2.0".to_string();

        let payload = serde_json::to_string_pretty(&manifest).expect("serialize manifest");
        fs::write(root.join(MANIFEST_FILE_NAME), payload).expect("write manifest");

        let err = ScenePackage::load(&root).expect_err("expect version error");
        match err {
            ScenePackageError::UnsupportedVersion { found } => {
                assert_eq!(found, "2.0");
                assert_ne!(found, MANIFEST_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
