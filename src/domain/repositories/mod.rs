//! Repository traits (ports)
//!
//! These traits define the contracts for external dependencies. They
//! follow the Dependency Inversion Principle: domain and application code
//! depend only on these traits, never on the concrete infrastructure
//! adapters that implement them.

mod block_device;
mod tool_driver;

pub use block_device::BlockDeviceReader;
pub use tool_driver::{ProcessOutput, StdioMode, ToolDriver};
