pub mod atlas;
pub mod mesh;
pub mod sphere;

pub use atlas::TextureAtlas;
pub use mesh::IndexedMesh;
pub use sphere::generate_sphere;
