pub mod analysis;
pub mod decode;
pub mod effects;
pub mod session;
pub mod sink;
pub mod source;
