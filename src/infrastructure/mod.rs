//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories: real block device
//! access, the external-tool driver (the only place that spawns
//! subprocesses), the partition prober, the streaming compression codec,
//! the container file codec, and the backup store.

pub mod block_device;
pub mod codec;
pub mod container;
pub mod partition_prober;
pub mod store;
pub mod tool_driver;
