pub mod demo;
pub mod prefabs;
