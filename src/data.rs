pub mod domain;
pub mod features;
pub mod frame;
pub mod indicator;
pub mod loader;
