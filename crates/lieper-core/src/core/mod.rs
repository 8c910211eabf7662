pub mod lie;
pub mod series;
