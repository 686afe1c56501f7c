//! GNS3 REST client.
//!
//! A [`Gns3Connector`] wraps the HTTP session with a GNS3 server. The
//! [`Project`], [`Node`], [`Link`] and [`Template`] entities are local records
//! that carry a connector and refresh themselves from the server's answers.
//!
//! ```no_run
//! # async fn example() -> gns3_client::Result<()> {
//! use gns3_client::{Gns3Connector, Project};
//!
//! let connector = Gns3Connector::new("http://gns3server:3080")?;
//! let mut lab = Project::named("lab").with_connector(connector);
//!
//! lab.get().await?;
//! for row in lab.links_summary().await? {
//!     println!("{} {} <-> {} {}", row.node_a, row.port_a, row.node_b, row.port_b);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod connector;
pub mod hydrate;
pub mod link;
pub mod models;
pub mod node;
pub mod project;
pub mod template;

#[cfg(test)]
mod test_support;

pub use connector::{Gns3Connector, Gns3ConnectorBuilder};
pub use gns3_core::client::{ClientConfig, RetryPolicy};
pub use gns3_core::config::Gns3ClientConfig;
pub use gns3_core::types::{
    ConsoleType, LinkType, NodeStatus, NodeType, ProjectStatus, TemplateCategory,
};
pub use gns3_core::uuid::{LinkId, NodeId, ProjectId, SnapshotId, TemplateId};
pub use gns3_core::Error;
pub use link::Link;
pub use models::{
    Compute, ComputeImage, ComputePorts, InventoryEntry, LinkEndpoint, LinkSummary, NodeSummary,
    Port, ProjectStats, Snapshot, Version,
};
pub use node::Node;
pub use project::Project;
pub use template::Template;

/// Convenient result alias that reuses the shared GNS3 error type.
pub type Result<T> = gns3_core::Result<T>;
