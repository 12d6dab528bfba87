pub mod disc;
pub mod frame;
pub mod postprocess;
pub mod sprites;
pub mod text;
