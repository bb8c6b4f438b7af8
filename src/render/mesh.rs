use bevy::math::{Vec2, Vec3};
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use crate::error::GlobeError;

/// Raw indexed triangle mesh, independent of any render backend.
///
/// `positions`, `normals` and `uvs` are index aligned. `line_indices` is an
/// optional list of edge pairs for debug line drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub line_indices: Vec<u32>,
}

impl IndexedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Check that attributes line up and every index points at a vertex.
    pub fn validate(&self) -> Result<(), GlobeError> {
        let count = self.positions.len();
        if self.normals.len() != count || self.uvs.len() != count {
            return Err(GlobeError::InvalidParameter(format!(
                "attribute lengths differ: {} positions, {} normals, {} uvs",
                count,
                self.normals.len(),
                self.uvs.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(GlobeError::InvalidParameter(format!(
                "triangle index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.line_indices.len() % 2 != 0 {
            return Err(GlobeError::InvalidParameter(format!(
                "line index count {} is not a multiple of 2",
                self.line_indices.len()
            )));
        }
        let out_of_range = self
            .indices
            .iter()
            .chain(&self.line_indices)
            .find(|&&i| i as usize >= count);
        if let Some(index) = out_of_range {
            return Err(GlobeError::InvalidParameter(format!(
                "index {index} out of range for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Flat quad in the XY plane facing +Z, centered on the origin.
    /// UV (0, 0) is the top left corner so images show upright.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            uvs: vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
            line_indices: vec![0, 1, 1, 2, 2, 3, 3, 0],
        }
    }

    /// Build the triangle list mesh asset.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        );

        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());

        mesh
    }

    /// Build a line list mesh from `line_indices`.
    pub fn to_bevy_wireframe(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::LineList,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        );

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        mesh.insert_indices(Indices::U32(self.line_indices.clone()));

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_valid_and_faces_forward() {
        let quad = IndexedMesh::quad(2.0, 2.0);
        quad.validate().unwrap();
        assert_eq!(quad.triangle_count(), 2);

        for [a, b, c] in quad.triangles() {
            let (a, b, c) = (
                quad.positions[a as usize],
                quad.positions[b as usize],
                quad.positions[c as usize],
            );
            // counter clockwise seen from +Z
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn validate_catches_dangling_index() {
        let mut quad = IndexedMesh::quad(1.0, 1.0);
        quad.indices.push(9);
        quad.indices.push(0);
        quad.indices.push(1);
        assert!(matches!(
            quad.validate(),
            Err(GlobeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn validate_catches_misaligned_attributes() {
        let mut quad = IndexedMesh::quad(1.0, 1.0);
        quad.uvs.pop();
        assert!(quad.validate().is_err());
    }

    #[test]
    fn bevy_mesh_carries_all_attributes() {
        let quad = IndexedMesh::quad(1.0, 1.0);
        let mesh = quad.to_bevy_mesh();

        assert_eq!(mesh.count_vertices(), 4);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
        assert_eq!(mesh.indices().map(|i| i.len()), Some(6));

        let lines = quad.to_bevy_wireframe();
        assert_eq!(lines.primitive_topology(), PrimitiveTopology::LineList);
        assert_eq!(lines.indices().map(|i| i.len()), Some(8));
    }
}
