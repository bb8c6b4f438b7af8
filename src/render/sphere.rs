/// UV sphere generation for the globe.
///
/// The sphere is centered on the origin with its poles on the Z axis.
/// Stacks run from the north pole (+Z) to the south pole, sectors sweep
/// counter clockwise around Z starting at +X. Texture `t` follows the
/// stacks so row 0 of a map image lands on the north pole.
///
/// Construction follows Song Ho Ahn's sphere article:
/// https://www.songho.ca/opengl/gl_sphere.html
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::math::{Vec2, Vec3};

use crate::error::GlobeError;
use crate::render::mesh::IndexedMesh;

pub const MIN_SECTORS: u32 = 3;
pub const MIN_STACKS: u32 = 2;

/// Generate a UV sphere of `radius` with `sector_count` slices around the
/// pole axis and `stack_count` rings from pole to pole.
pub fn generate_sphere(
    sector_count: u32,
    stack_count: u32,
    radius: f32,
) -> Result<IndexedMesh, GlobeError> {
    if sector_count < MIN_SECTORS {
        return Err(GlobeError::InvalidParameter(format!(
            "sector_count must be at least {MIN_SECTORS}, got {sector_count}"
        )));
    }
    if stack_count < MIN_STACKS {
        return Err(GlobeError::InvalidParameter(format!(
            "stack_count must be at least {MIN_STACKS}, got {stack_count}"
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(GlobeError::InvalidParameter(format!(
            "radius must be positive and finite, got {radius}"
        )));
    }

    // indices are u32, every vertex must be addressable
    let vertex_count = (sector_count as u64 + 1) * (stack_count as u64 + 1);
    if vertex_count > u32::MAX as u64 {
        return Err(GlobeError::InvalidParameter(format!(
            "{sector_count}x{stack_count} sphere needs {vertex_count} vertices, \
             more than u32 indices can address"
        )));
    }
    let vertex_count = vertex_count as usize;
    let mut mesh = IndexedMesh {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(triangle_index_count(sector_count, stack_count)),
        line_indices: Vec::with_capacity(4 * sector_count as usize * stack_count as usize),
    };

    let sector_step = TAU / sector_count as f32;
    let stack_step = PI / stack_count as f32;
    let length_inv = 1.0 / radius;

    for i in 0..=stack_count {
        // pole rows are pinned, cos(pi/2) is not exactly zero in f32
        let (xy, z) = if i == 0 {
            (0.0, radius)
        } else if i == stack_count {
            (0.0, -radius)
        } else {
            let stack_angle = FRAC_PI_2 - i as f32 * stack_step;
            (radius * stack_angle.cos(), radius * stack_angle.sin())
        };

        // first and last sector share a position but not a texture coordinate
        for j in 0..=sector_count {
            let (x, y) = if j == sector_count {
                (xy, 0.0)
            } else {
                let sector_angle = j as f32 * sector_step;
                (xy * sector_angle.cos(), xy * sector_angle.sin())
            };

            let position = Vec3::new(x, y, z);
            mesh.positions.push(position);
            mesh.normals.push(position * length_inv);
            mesh.uvs.push(Vec2::new(
                j as f32 / sector_count as f32,
                i as f32 / stack_count as f32,
            ));
        }
    }

    for i in 0..stack_count {
        let mut k1 = i * (sector_count + 1); // start of this stack
        let mut k2 = k1 + sector_count + 1; // start of next stack

        for _ in 0..sector_count {
            // top pole row collapses k1, skip the zero area triangle
            if i != 0 {
                mesh.indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            // same for k2 on the bottom pole row
            if i != stack_count - 1 {
                mesh.indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }

            // vertical then horizontal edge
            mesh.line_indices.extend_from_slice(&[k1, k2, k1, k1 + 1]);

            k1 += 1;
            k2 += 1;
        }
    }

    tracing::debug!(
        sector_count,
        stack_count,
        radius,
        vertices = mesh.positions.len(),
        triangles = mesh.triangle_count(),
        "generated sphere"
    );

    Ok(mesh)
}

/// Number of triangle indices `generate_sphere` emits.
pub fn triangle_index_count(sector_count: u32, stack_count: u32) -> usize {
    6 * sector_count as usize * stack_count.saturating_sub(1) as usize
}

/// Texture coordinate of a point on the sphere surface.
/// Inverse of the parameterization used by `generate_sphere`.
pub fn surface_to_uv(point: Vec3, radius: f32) -> Vec2 {
    let sector_angle = point.y.atan2(point.x).rem_euclid(TAU);
    let stack_angle = (point.z / radius).clamp(-1.0, 1.0).asin();

    let s = sector_angle / TAU;
    let t = (FRAC_PI_2 - stack_angle) / PI;
    Vec2::new(s, t.clamp(0.0, 1.0))
}

/// Nearest intersection of a ray with an origin centered sphere,
/// ignoring hits behind the ray origin.
pub fn ray_sphere_intersection(origin: Vec3, direction: Vec3, radius: f32) -> Option<Vec3> {
    let direction = direction.try_normalize()?;

    // |o + t*d|^2 = r^2 with |d| = 1
    let b = origin.dot(direction);
    let c = origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    let t = if near >= 0.0 {
        near
    } else if far >= 0.0 {
        far // origin is inside the sphere
    } else {
        return None;
    };

    Some(origin + direction * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn vertex(sectors: u32, stack: u32, sector: u32) -> usize {
        (stack * (sectors + 1) + sector) as usize
    }

    #[test]
    fn counts_match_formula() {
        for (sectors, stacks) in [(3, 2), (4, 2), (8, 5), (36, 18), (70, 70)] {
            let mesh = generate_sphere(sectors, stacks, 2.5).unwrap();
            assert_eq!(
                mesh.vertex_count(),
                ((sectors + 1) * (stacks + 1)) as usize
            );
            assert_eq!(mesh.indices.len(), 6 * (sectors * (stacks - 1)) as usize);
            assert_eq!(mesh.indices.len(), triangle_index_count(sectors, stacks));
            assert_eq!(mesh.line_indices.len(), (4 * sectors * stacks) as usize);
            mesh.validate().unwrap();
        }
    }

    #[test]
    fn small_sphere_scenario() {
        let mesh = generate_sphere(4, 2, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 15);
        assert_eq!(mesh.indices.len(), 24);
        assert_eq!(mesh.triangle_count(), 8);

        // each stack contributes one triangle per sector
        let top = mesh.indices[..12].to_vec();
        assert_eq!(top, vec![1, 5, 6, 2, 6, 7, 3, 7, 8, 4, 8, 9]);
        let bottom = mesh.indices[12..].to_vec();
        assert_eq!(bottom, vec![5, 10, 6, 6, 11, 7, 7, 12, 8, 8, 13, 9]);
    }

    #[test]
    fn vertices_lie_on_sphere() {
        let radius = 3.0;
        let mesh = generate_sphere(24, 12, radius).unwrap();
        for v in &mesh.positions {
            assert!((v.length() - radius).abs() < EPS * radius, "{v:?}");
        }
    }

    #[test]
    fn normals_are_scaled_positions() {
        let radius = 6.5;
        let mesh = generate_sphere(16, 9, radius).unwrap();
        for (v, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert_eq!(*n, *v * (1.0 / radius));
            assert!((n.length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn seam_shares_position_but_not_s() {
        let (sectors, stacks) = (12, 7);
        let mesh = generate_sphere(sectors, stacks, 1.0).unwrap();
        for i in 0..=stacks {
            let first = vertex(sectors, i, 0);
            let last = vertex(sectors, i, sectors);
            assert_eq!(mesh.positions[first], mesh.positions[last]);
            assert_eq!(mesh.normals[first], mesh.normals[last]);
            assert_eq!(mesh.uvs[first].x, 0.0);
            assert_eq!(mesh.uvs[last].x, 1.0);
            assert_eq!(mesh.uvs[first].y, mesh.uvs[last].y);
        }
    }

    #[test]
    fn poles_collapse_to_a_point() {
        let (sectors, stacks, radius) = (10, 6, 2.0);
        let mesh = generate_sphere(sectors, stacks, radius).unwrap();
        for j in 0..=sectors {
            assert_eq!(
                mesh.positions[vertex(sectors, 0, j)],
                Vec3::new(0.0, 0.0, radius)
            );
            assert_eq!(
                mesh.positions[vertex(sectors, stacks, j)],
                Vec3::new(0.0, 0.0, -radius)
            );
        }
    }

    #[test]
    fn no_degenerate_triangles() {
        for (sectors, stacks) in [(3, 2), (4, 2), (16, 8), (70, 70)] {
            let mesh = generate_sphere(sectors, stacks, 1.0).unwrap();
            for [a, b, c] in mesh.triangles() {
                let (a, b, c) = (
                    mesh.positions[a as usize],
                    mesh.positions[b as usize],
                    mesh.positions[c as usize],
                );
                let area = (b - a).cross(c - a).length() / 2.0;
                assert!(area > 1e-7, "zero area triangle in {sectors}x{stacks}");
            }
        }
    }

    #[test]
    fn triangles_wind_outwards() {
        let mesh = generate_sphere(16, 8, 1.0).unwrap();
        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (
                mesh.positions[a as usize],
                mesh.positions[b as usize],
                mesh.positions[c as usize],
            );
            let normal = (b - a).cross(c - a);
            let center = (a + b + c) / 3.0;
            assert!(normal.dot(center) > 0.0);
        }
    }

    #[test]
    fn texture_coordinates_stay_in_unit_square() {
        let mesh = generate_sphere(9, 4, 1.0).unwrap();
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            generate_sphere(2, 4, 1.0),
            Err(GlobeError::InvalidParameter(_))
        ));
        assert!(matches!(
            generate_sphere(8, 1, 1.0),
            Err(GlobeError::InvalidParameter(_))
        ));
        assert!(generate_sphere(8, 4, 0.0).is_err());
        assert!(generate_sphere(8, 4, -1.0).is_err());
        assert!(generate_sphere(8, 4, f32::NAN).is_err());
    }

    #[test]
    fn rejects_spheres_too_large_for_u32_indices() {
        assert!(matches!(
            generate_sphere(65_536, 65_536, 1.0),
            Err(GlobeError::InvalidParameter(_))
        ));
        assert!(matches!(
            generate_sphere(u32::MAX, 2, 1.0),
            Err(GlobeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn uv_inverts_generation() {
        let (sectors, stacks, radius) = (16, 8, 4.0);
        let mesh = generate_sphere(sectors, stacks, radius).unwrap();
        // skip the seam column and the poles where the mapping is ambiguous
        for i in 1..stacks {
            for j in 0..sectors {
                let index = vertex(sectors, i, j);
                let uv = surface_to_uv(mesh.positions[index], radius);
                assert!((uv - mesh.uvs[index]).abs().max_element() < 1e-4);
            }
        }
    }

    #[test]
    fn ray_hits_near_side() {
        let hit = ray_sphere_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 1.0).unwrap();
        assert!((hit - Vec3::Z).length() < EPS);

        let miss = ray_sphere_intersection(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z, 1.0);
        assert!(miss.is_none());

        let behind = ray_sphere_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, 1.0);
        assert!(behind.is_none());
    }

    #[test]
    fn ray_from_inside_hits_far_side() {
        let hit = ray_sphere_intersection(Vec3::ZERO, Vec3::X, 2.0).unwrap();
        assert!((hit - Vec3::new(2.0, 0.0, 0.0)).length() < EPS);
    }
}
