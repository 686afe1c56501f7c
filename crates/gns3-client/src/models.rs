//! Plain records returned by the GNS3 API that carry no lifecycle of their own.

use chrono::{DateTime, Utc};
use gns3_core::types::{LinkType, NodeStatus, NodeType};
use gns3_core::uuid::{NodeId, ProjectId, SnapshotId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server version information returned by `GET /version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    /// Server version string (e.g. `2.2.0`).
    pub version: String,
    /// Whether the server runs on the local machine.
    #[serde(default)]
    pub local: bool,
}

/// Object counts of a project, returned by `GET /projects/{id}/stats`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectStats {
    /// Number of drawings.
    #[serde(default)]
    pub drawings: u32,
    /// Number of links.
    #[serde(default)]
    pub links: u32,
    /// Number of nodes.
    #[serde(default)]
    pub nodes: u32,
    /// Number of snapshots.
    #[serde(default)]
    pub snapshots: u32,
}

/// Saved state of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub snapshot_id: SnapshotId,
    /// Snapshot name.
    pub name: String,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Creation timestamp.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Compute (emulation host) registered with the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compute {
    /// Compute identifier (`local` for the controller's own host).
    pub compute_id: String,
    /// Display name.
    pub name: String,
    /// Whether the controller is connected to the compute.
    #[serde(default)]
    pub connected: bool,
    /// Host name or address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// TCP port of the compute API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Protocol used to reach the compute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// User for the compute API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// CPU usage in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage_percent: Option<f64>,
    /// Memory usage in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_percent: Option<f64>,
    /// Last error reported by the compute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Capabilities advertised by the compute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Value>,
}

/// Emulator image available on a compute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputeImage {
    /// Image file name.
    pub filename: String,
    /// Path relative to the image directory.
    pub path: String,
    /// MD5 checksum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
}

/// Port ranges and ports in use on a compute.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputePorts {
    /// Range reserved for consoles.
    #[serde(default)]
    pub console_port_range: Vec<u16>,
    /// Console ports in use.
    #[serde(default)]
    pub console_ports: Vec<u16>,
    /// Range reserved for UDP tunnels.
    #[serde(default)]
    pub udp_port_range: Vec<u16>,
    /// UDP ports in use.
    #[serde(default)]
    pub udp_ports: Vec<u16>,
}

/// One side of a link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkEndpoint {
    /// Node the link is attached to.
    pub node_id: NodeId,
    /// Adapter number on the node.
    pub adapter_number: u32,
    /// Port number on the adapter.
    pub port_number: u32,
    /// Label drawn next to the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
}

impl LinkEndpoint {
    /// Create an endpoint without a label.
    #[must_use]
    pub const fn new(node_id: NodeId, adapter_number: u32, port_number: u32) -> Self {
        Self {
            node_id,
            adapter_number,
            port_number,
            label: None,
        }
    }

    /// Whether this endpoint sits on the given adapter and port.
    #[must_use]
    pub const fn is_port(&self, adapter_number: u32, port_number: u32) -> bool {
        self.adapter_number == adapter_number && self.port_number == port_number
    }
}

/// Network port exposed by a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Port {
    /// Full port name (e.g. `Ethernet0/1`).
    pub name: String,
    /// Abbreviated name (e.g. `e0/1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Adapter number.
    pub adapter_number: u32,
    /// Port number on the adapter.
    pub port_number: u32,
    /// Layer-2 type of the port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    /// Supported data link types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_link_types: Option<Value>,
}

/// Row of a project's node summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeSummary {
    /// Node name.
    pub name: String,
    /// Run state.
    pub status: Option<NodeStatus>,
    /// Console port.
    pub console: Option<u16>,
    /// Node identifier.
    pub node_id: Option<NodeId>,
}

/// Row of a project's link summary, named by node and port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSummary {
    /// Name of the first node.
    pub node_a: String,
    /// Port name on the first node.
    pub port_a: String,
    /// Name of the second node.
    pub node_b: String,
    /// Port name on the second node.
    pub port_b: String,
}

/// Console access details for one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryEntry {
    /// Host serving the console.
    pub server: String,
    /// Node name.
    pub name: String,
    /// Console port.
    pub console_port: Option<u16>,
    /// Node type.
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
}

/// Error body returned by the server with a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerErrorBody {
    /// Human readable message.
    pub message: String,
    /// HTTP status echoed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
