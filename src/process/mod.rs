pub mod geometry;
pub mod obj;
pub mod pipeline;
pub mod timing;
