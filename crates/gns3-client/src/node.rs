//! Node entity: an emulated device or builtin appliance inside a project.

use crate::connector::Gns3Connector;
use crate::hydrate::merge_into;
use crate::link::Link;
use crate::models::Port;
use crate::Result;
use gns3_core::types::{ConsoleType, NodeStatus, NodeType};
use gns3_core::uuid::{NodeId, ProjectId, TemplateId};
use gns3_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::mem;
use tracing::debug;

const DEFAULT_COMPUTE_ID: &str = "local";

fn default_compute_id() -> String {
    DEFAULT_COMPUTE_ID.to_string()
}

/// A GNS3 node.
///
/// `template` holds a template *name* and never leaves the client; it is resolved
/// to `template_id` when the node is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node name, unique within the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Node identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Compute hosting the node.
    #[serde(default = "default_compute_id")]
    pub compute_id: String,
    /// Emulator or builtin type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// Working directory on the compute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_directory: Option<String>,
    /// Run state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    /// Network ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<Port>>,
    /// Format used to name ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name_format: Option<String>,
    /// Number of ports per segment in port names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_segment_size: Option<u32>,
    /// Name of the first port when it differs from the format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_port_name: Option<String>,
    /// Whether the node is locked on the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Canvas label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Console port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<u16>,
    /// Console host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_host: Option<String>,
    /// Console protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_type: Option<ConsoleType>,
    /// Whether the console opens when the node starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_auto_start: Option<bool>,
    /// Command line used to start the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    /// Per-adapter overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_adapters: Option<Vec<Value>>,
    /// Symbol height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Symbol width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Symbol path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Canvas X position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Canvas Y position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Canvas Z order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    /// Template the node was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    /// Emulator specific properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Template name, resolved to `template_id` on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Links attached to this node, filled by [`Node::get_links`].
    #[serde(skip)]
    pub links: Vec<Link>,
    #[serde(skip)]
    connector: Option<Gns3Connector>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            project_id: None,
            node_id: None,
            compute_id: default_compute_id(),
            node_type: None,
            node_directory: None,
            status: None,
            ports: None,
            port_name_format: None,
            port_segment_size: None,
            first_port_name: None,
            locked: None,
            label: None,
            console: None,
            console_host: None,
            console_type: None,
            console_auto_start: None,
            command_line: None,
            custom_adapters: None,
            height: None,
            width: None,
            symbol: None,
            x: None,
            y: None,
            z: None,
            template_id: None,
            properties: None,
            template: None,
            links: Vec::new(),
            connector: None,
        }
    }
}

impl Node {
    /// Create an empty node record on the `local` compute.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for the node called `name` in the given project.
    #[must_use]
    pub fn in_project(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    /// Attach the connector used for server calls.
    #[must_use]
    pub fn with_connector(mut self, connector: Gns3Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Port at the given adapter and port number.
    #[must_use]
    pub fn port_at(&self, adapter_number: u32, port_number: u32) -> Option<&Port> {
        self.ports.as_deref()?.iter().find(|port| {
            port.adapter_number == adapter_number && port.port_number == port_number
        })
    }

    /// Port with the given name.
    #[must_use]
    pub fn port_named(&self, name: &str) -> Option<&Port> {
        self.ports.as_deref()?.iter().find(|port| port.name == name)
    }

    /// Fetch the node record and overwrite local fields with the server's.
    ///
    /// When only `name` is known the node id is looked up in the project first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] without a connector, project id, or
    /// node id or name, and [`Error::NotFound`] for an unknown name.
    pub async fn refresh(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let path = self.path().await?;
        let response: Value = connector.get(&path).await?;
        self.apply(response)
    }

    /// Fetch the node record and its links.
    ///
    /// # Errors
    ///
    /// See [`Node::refresh`].
    pub async fn get(&mut self) -> Result<()> {
        self.get_links().await
    }

    /// Refresh the node, then collect the project's links that end on it.
    ///
    /// # Errors
    ///
    /// See [`Node::refresh`].
    pub async fn get_links(&mut self) -> Result<()> {
        self.refresh().await?;
        let (project_id, node_id) = self.ids().await?;
        let connector = self.connector()?.clone();

        self.links = connector
            .get_links(project_id)
            .await?
            .into_iter()
            .filter(|link| link.touches(node_id))
            .collect();
        Ok(())
    }

    /// Create the node from its own fields.
    ///
    /// A `template` name is resolved to `template_id` first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without a `node_type` and
    /// [`Error::NotFound`] for an unknown template name.
    pub async fn create(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id()?;
        if self.node_type.is_none() {
            return Err(Error::ValidationError("Need to submit 'node_type'".to_string()));
        }
        if self.template_id.is_none() {
            if let Some(template) = self.template.clone() {
                self.template_id = Some(resolve_template(&connector, &template).await?);
            }
        }

        let mut body = serde_json::to_value(&*self)?;
        if let Value::Object(fields) = &mut body {
            fields.remove("project_id");
            fields.remove("template");
        }

        let response: Value = connector
            .post(&format!("projects/{project_id}/nodes"), &body)
            .await?;
        self.apply(response)
    }

    /// Create the node by instantiating its template at `x`/`y` on `compute_id`.
    ///
    /// The server names the node after the template; a requested `name` is
    /// applied afterwards with an update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without `template` or `template_id`.
    pub async fn create_from_template(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id()?;
        let template_id = match (self.template_id, self.template.clone()) {
            (Some(template_id), _) => template_id,
            (None, Some(template)) => resolve_template(&connector, &template).await?,
            (None, None) => {
                return Err(Error::ValidationError(
                    "Need to submit 'template' or 'template_id'".to_string(),
                ))
            }
        };

        let body = json!({
            "x": self.x.unwrap_or(0),
            "y": self.y.unwrap_or(0),
            "compute_id": self.compute_id,
        });
        let requested_name = self.name.clone();

        let response: Value = connector
            .post(&format!("projects/{project_id}/templates/{template_id}"), &body)
            .await?;
        self.apply(response)?;

        match requested_name {
            Some(name) if self.name.as_deref() != Some(name.as_str()) => {
                debug!(from = ?self.name, to = %name, "Renaming node created from template");
                self.update(&json!({ "name": name })).await
            }
            _ => Ok(()),
        }
    }

    /// Update the node with the given changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if a change does not fit a field's type.
    pub async fn update<C>(&mut self, changes: &C) -> Result<()>
    where
        C: Serialize + ?Sized,
    {
        let connector = self.connector()?.clone();
        let path = self.path().await?;
        let changes = serde_json::to_value(changes)?;
        merge_into(self, changes.clone())?;

        let response: Value = connector.put(&path, &changes).await?;
        self.apply(response)
    }

    /// Delete the node; the local record loses its ids and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let path = self.path().await?;
        connector.delete(&path).await?;
        self.project_id = None;
        self.node_id = None;
        self.name = None;
        Ok(())
    }

    /// Start the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn start(&mut self) -> Result<()> {
        self.action("start").await
    }

    /// Stop the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stop(&mut self) -> Result<()> {
        self.action("stop").await
    }

    /// Suspend the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn suspend(&mut self) -> Result<()> {
        self.action("suspend").await
    }

    /// Reload the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reload(&mut self) -> Result<()> {
        self.action("reload").await
    }

    /// Read a file from the node's working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist.
    pub async fn get_file(&mut self, path: &str) -> Result<String> {
        let connector = self.connector()?.clone();
        let node_path = self.path().await?;
        connector
            .get_text(&format!("{node_path}/files/{}", path.trim_start_matches('/')))
            .await
    }

    /// Write a file into the node's working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn write_file(&mut self, path: &str, data: impl Into<String>) -> Result<()> {
        let connector = self.connector()?.clone();
        let node_path = self.path().await?;
        connector
            .post_text(
                &format!("{node_path}/files/{}", path.trim_start_matches('/')),
                data,
            )
            .await
    }

    async fn action(&mut self, action: &str) -> Result<()> {
        let connector = self.connector()?.clone();
        let path = format!("{}/{action}", self.path().await?);
        match connector.post_action::<Value>(&path, None).await? {
            Some(response) => self.apply(response),
            None => self.refresh().await,
        }
    }

    fn connector(&self) -> Result<&Gns3Connector> {
        self.connector
            .as_ref()
            .ok_or_else(|| Error::MissingAttribute("connector".to_string()))
    }

    fn project_id(&self) -> Result<ProjectId> {
        self.project_id
            .ok_or_else(|| Error::MissingAttribute("project_id".to_string()))
    }

    async fn ids(&mut self) -> Result<(ProjectId, NodeId)> {
        let project_id = self.project_id()?;
        if let Some(node_id) = self.node_id {
            return Ok((project_id, node_id));
        }

        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::MissingAttribute("node_id or name".to_string()))?;
        let node_id = self
            .connector()?
            .get_nodes(project_id)
            .await?
            .into_iter()
            .find(|node| node.name.as_deref() == Some(name.as_str()))
            .and_then(|node| node.node_id)
            .ok_or_else(|| {
                Error::NotFound(format!("Node `{name}` not found in project {project_id}"))
            })?;

        self.node_id = Some(node_id);
        Ok((project_id, node_id))
    }

    async fn path(&mut self) -> Result<String> {
        let (project_id, node_id) = self.ids().await?;
        Ok(format!("projects/{project_id}/nodes/{node_id}"))
    }

    fn apply(&mut self, response: Value) -> Result<()> {
        let mut updated = merge_into(self, response)?;
        updated.connector = self.connector.take();
        updated.links = mem::take(&mut self.links);
        *self = updated;
        Ok(())
    }
}

async fn resolve_template(connector: &Gns3Connector, name: &str) -> Result<TemplateId> {
    connector
        .get_template_by_name(name)
        .await?
        .and_then(|template| template.template_id)
        .ok_or_else(|| Error::NotFound(format!("Template `{name}` not found")))
}
