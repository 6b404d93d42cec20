//! infworld library - procedurally generated infinite terrain

pub mod camera;
pub mod cli;
pub mod error;
pub mod noise;
pub mod params;
pub mod rendering;
pub mod terrain;
