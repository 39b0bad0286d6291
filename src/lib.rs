/*!
Fixed-point Mandelbrot compute core.

Commands arrive as bytes, describe a grid of points in Q8.56 fixed point, and are swept
pixel by pixel across a pool of pipelined escape-time engines. Results leave as 6-byte
records on a flow-controlled byte stream. [`device::Device`] wires the pieces together.
*/

pub mod collector;
pub mod command;
pub mod decoder;
pub mod device;
pub mod engine;
pub mod escape_time;
pub mod fixed;
pub mod pixel;
pub mod pool;
pub mod priority;
pub mod scheduler;
pub mod serializer;
pub mod stream;
pub mod view;

pub use device::Device;
pub use fixed::FixedPoint;
pub use pixel::PixelResult;
pub use view::ViewCommand;
