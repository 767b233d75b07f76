pub mod sequence;
pub mod text;
