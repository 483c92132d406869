//! Content resolution: which routes exist and which file backs each one.
//!
//! ```text
//! content/
//!   report_1.mdx ──► discover_routes() ──► RouteDescriptor ["report_1"]
//!   guide/                                 RouteDescriptor ["guide"]
//!     index.md
//!                        │
//!                        ▼
//!              IndexHandle::lookup(["guide"])
//!                        │
//!                        ▼
//!              ContentRecord { content/guide/index.md, metadata }
//! ```

pub mod discovery;
pub mod index;
mod record;

pub use discovery::{DiscoveryError, RouteTable, discover_routes};
pub use index::{ContentIndex, IndexError, IndexHandle};
pub use record::{ContentRecord, Metadata, MetadataError, RouteDescriptor, route_stem};
