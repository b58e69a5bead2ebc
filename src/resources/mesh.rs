use std::collections::HashMap;

use crate::{
    data_structures::model::{Mesh, ModelVertex},
    error::Result,
    render::{GeometryId, GraphicsDevice},
};

/**
 * Converts a triangulated, single-indexed obj model into a [`Mesh`].
 *
 * Missing normals and texture coordinates become zero. The v coordinate is
 * flipped since obj files put the texture origin at the bottom left.
 */
pub fn mesh_from_obj(model: &tobj::Model, material: usize) -> Mesh {
    let m = &model.mesh;
    let vertices = (0..m.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.positions[i * 3],
                m.positions[i * 3 + 1],
                m.positions[i * 3 + 2],
            ],
            normal: [
                m.normals.get(i * 3).map_or(0.0, |f| *f),
                m.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
            tex_coords: [
                m.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    // Trailing indices that do not form a whole triangle are dropped.
    let faces = m
        .indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    Mesh {
        name: model.name.clone(),
        vertices,
        faces,
        material,
    }
}

/// GPU handle of a mesh that made it onto the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadedMesh {
    pub geometry: GeometryId,
    pub index_count: u32,
}

/// Creates each mesh's vertex and index buffers the first time it is drawn.
#[derive(Debug, Default)]
pub struct GeometryUploader {
    /// `None` marks meshes that were rejected and are never retried.
    uploaded: HashMap<usize, Option<UploadedMesh>>,
}

impl GeometryUploader {
    /// Validates `mesh` and hands its vertices and indices to the device.
    pub fn upload<D: GraphicsDevice + ?Sized>(device: &mut D, mesh: &Mesh) -> Result<UploadedMesh> {
        mesh.validate()?;
        let indices = mesh.indices();
        let geometry = device.create_geometry(&mesh.name, &mesh.vertices, &indices)?;
        Ok(UploadedMesh {
            geometry,
            index_count: indices.len() as u32,
        })
    }

    /// Cached upload of the mesh at `mesh_index`. Returns `None` for meshes
    /// that cannot be drawn: empty ones, and ones the device or validation
    /// rejected. A rejection is logged once.
    pub fn get_or_upload<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        mesh_index: usize,
        mesh: &Mesh,
    ) -> Option<UploadedMesh> {
        if let Some(cached) = self.uploaded.get(&mesh_index) {
            return *cached;
        }
        let uploaded = if mesh.faces.is_empty() || mesh.vertices.is_empty() {
            log::debug!("mesh {:?} has no triangles, skipping", mesh.name);
            None
        } else {
            match Self::upload(device, mesh) {
                Ok(uploaded) => Some(uploaded),
                Err(e) => {
                    log::warn!("Mesh {mesh_index} ({:?}) is skipped: {e}", mesh.name);
                    None
                }
            }
        };
        self.uploaded.insert(mesh_index, uploaded);
        uploaded
    }

    /// Meshes that currently have GPU buffers.
    pub fn uploaded_count(&self) -> usize {
        self.uploaded.values().filter(|u| u.is_some()).count()
    }
}
