pub mod error;
pub mod random;
pub mod storage;
pub mod select;
pub mod states;
pub mod walls;
pub mod params;
pub mod engine;
pub mod kdtree;
pub mod collision;
pub mod integrator;
pub mod scenario;
