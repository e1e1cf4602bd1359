pub mod camera;
pub mod input;
pub mod mesh;
pub mod texture;
pub mod vertex;
