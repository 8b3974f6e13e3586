//! OBJ mesh loading.
//!
//! Every mesh in the file is merged into a single vertex/index stream:
//! - faces are triangulated and re-indexed so one index addresses
//!   position, normal and UV together
//! - UVs are flipped vertically to match Vulkan's top-left image origin
//! - tangents are derived from positions and UVs and averaged per vertex
//! - missing normals or UVs are left at zero

use std::path::Path;

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};
use vkpbr_rhi::vertex::Vertex;

use crate::error::{ResourceError, ResourceResult};

/// Indexed triangle list ready for upload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Loads and merges all meshes of the OBJ file at `path`.
    ///
    /// Materials referenced by the file are ignored.
    pub fn load_obj(path: &Path) -> ResourceResult<Self> {
        if !path.exists() {
            return Err(ResourceError::FileNotFound(path.to_path_buf()));
        }

        let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
        if let Err(e) = materials {
            debug!("Ignoring materials of {}: {}", path.display(), e);
        }

        let mesh = Self::from_models(&models)?;
        if mesh.indices.is_empty() {
            return Err(ResourceError::NoMeshes(path.to_path_buf()));
        }

        info!(
            "Loaded {}: {} vertices, {} triangles from {} mesh(es)",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count(),
            models.len()
        );

        Ok(mesh)
    }

    /// Merges single-index, triangulated `tobj` models.
    pub fn from_models(models: &[tobj::Model]) -> ResourceResult<Self> {
        let mut mesh = Self::default();

        for model in models {
            let source = &model.mesh;
            let base = u32::try_from(mesh.vertices.len()).map_err(|_| ResourceError::IndexOverflow)?;
            let vertex_count = source.positions.len() / 3;

            if source.normals.is_empty() {
                warn!("Mesh '{}' has no normals", model.name);
            }

            mesh.vertices.extend((0..vertex_count).map(|i| {
                let position = vec3_at(&source.positions, i);
                let normal = if source.normals.len() >= (i + 1) * 3 {
                    vec3_at(&source.normals, i)
                } else {
                    Vec3::ZERO
                };
                let tex_coord = if source.texcoords.len() >= (i + 1) * 2 {
                    Vec2::new(source.texcoords[2 * i], 1.0 - source.texcoords[2 * i + 1])
                } else {
                    Vec2::ZERO
                };
                Vertex::new(position, normal, tex_coord, Vec3::ZERO)
            }));

            for &index in &source.indices {
                let merged = base.checked_add(index).ok_or(ResourceError::IndexOverflow)?;
                mesh.indices.push(merged);
            }
        }

        u32::try_from(mesh.vertices.len()).map_err(|_| ResourceError::IndexOverflow)?;
        compute_tangents(&mut mesh.vertices, &mesh.indices);

        Ok(mesh)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn vec3_at(data: &[f32], i: usize) -> Vec3 {
    Vec3::new(data[3 * i], data[3 * i + 1], data[3 * i + 2])
}

/// Accumulates per-triangle tangents on each corner, then normalizes them
/// and makes them orthogonal to the vertex normal.
///
/// Triangles with degenerate UVs contribute nothing; vertices that receive
/// no contribution keep a zero tangent.
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accumulated = vec![Vec3::ZERO; vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let (Some(v0), Some(v1), Some(v2)) = (vertices.get(i0), vertices.get(i1), vertices.get(i2))
        else {
            continue;
        };

        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;
        let duv1 = v1.tex_coord - v0.tex_coord;
        let duv2 = v2.tex_coord - v0.tex_coord;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }

        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        for index in [i0, i1, i2] {
            accumulated[index] += tangent;
        }
    }

    for (vertex, tangent) in vertices.iter_mut().zip(accumulated) {
        let n = vertex.normal;
        let orthogonal = if n == Vec3::ZERO {
            tangent
        } else {
            tangent - n * n.dot(tangent)
        };
        vertex.tangent = orthogonal.normalize_or_zero();
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use super::*;

    const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const TRIANGLE_OBJ: &str = "\
o tri
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    fn parse(source: &str) -> Vec<tobj::Model> {
        let (models, _) = tobj::load_obj_buf(
            &mut BufReader::new(source.as_bytes()),
            &tobj::GPU_LOAD_OPTIONS,
            |_| Ok(Default::default()),
        )
        .unwrap();
        models
    }

    #[test]
    fn test_quad_is_triangulated() {
        let mesh = MeshData::from_models(&parse(QUAD_OBJ)).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_uvs_are_flipped() {
        let mesh = MeshData::from_models(&parse(QUAD_OBJ)).unwrap();
        let origin = mesh
            .vertices
            .iter()
            .find(|v| v.position == Vec3::ZERO)
            .unwrap();
        assert_eq!(origin.tex_coord, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_tangent_follows_u_axis() {
        let mesh = MeshData::from_models(&parse(QUAD_OBJ)).unwrap();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, Vec3::Z);
            assert!((vertex.tangent - Vec3::X).length() < 1e-5, "{:?}", vertex.tangent);
        }
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let mesh = MeshData::from_models(&parse(TRIANGLE_OBJ)).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, Vec3::ZERO);
            assert_eq!(vertex.tex_coord, Vec2::ZERO);
            assert_eq!(vertex.tangent, Vec3::ZERO);
        }
    }

    #[test]
    fn test_meshes_are_merged_with_offsets() {
        let mut models = parse(TRIANGLE_OBJ);
        models.extend(parse(TRIANGLE_OBJ));

        let mesh = MeshData::from_models(&models).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.indices[3..].iter().all(|&i| i >= 3));
    }

    #[test]
    fn test_degenerate_uvs_are_skipped() {
        let mut vertices = vec![
            Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO, Vec3::ZERO),
            Vertex::new(Vec3::X, Vec3::Z, Vec2::ZERO, Vec3::ZERO),
            Vertex::new(Vec3::Y, Vec3::Z, Vec2::ZERO, Vec3::ZERO),
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        assert!(vertices.iter().all(|v| v.tangent == Vec3::ZERO));
    }

    #[test]
    fn test_out_of_range_indices_are_ignored() {
        let mut vertices = vec![Vertex::default(); 2];
        compute_tangents(&mut vertices, &[0, 1, 7]);
        assert!(vertices.iter().all(|v| v.tangent == Vec3::ZERO));
    }

    #[test]
    fn test_missing_file() {
        let err = MeshData::load_obj(Path::new("no/such/model.obj")).unwrap_err();
        assert!(matches!(err, ResourceError::FileNotFound(_)));
    }
}
