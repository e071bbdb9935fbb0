//! Space Invaders drivers.

mod pixels_driver;
pub mod winit_driver;

pub use pixels_driver::PixelsRenderDriver;
pub use winit_driver::WinitWindowDriver;
