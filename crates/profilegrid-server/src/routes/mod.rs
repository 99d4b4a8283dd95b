pub mod grid;
pub mod health;
pub mod periods;
pub mod properties;
