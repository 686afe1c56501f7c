//! Link between two node ports.

use crate::connector::Gns3Connector;
use crate::hydrate::merge_into;
use crate::models::LinkEndpoint;
use crate::Result;
use gns3_core::types::LinkType;
use gns3_core::uuid::{LinkId, NodeId, ProjectId};
use gns3_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A GNS3 link.
///
/// Links always join exactly two endpoints; the server enforces this on creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    /// Link identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<LinkId>,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Layer-2 type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    /// Whether traffic is suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
    /// Both endpoints of the link.
    #[serde(default)]
    pub nodes: Vec<LinkEndpoint>,
    /// Packet filters (delay, loss, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    /// Whether a packet capture is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capturing: Option<bool>,
    /// Capture file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_file_name: Option<String>,
    /// Capture file path on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_file_path: Option<String>,
    /// Compute running the capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_compute_id: Option<String>,
    #[serde(skip)]
    connector: Option<Gns3Connector>,
}

impl Link {
    /// Create an empty link record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for a new link joining `nodes` in the given project.
    #[must_use]
    pub fn in_project(project_id: ProjectId, nodes: Vec<LinkEndpoint>) -> Self {
        Self {
            project_id: Some(project_id),
            nodes,
            ..Self::default()
        }
    }

    /// Attach the connector used for server calls.
    #[must_use]
    pub fn with_connector(mut self, connector: Gns3Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Whether one of the endpoints sits on the given node.
    #[must_use]
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.nodes.iter().any(|endpoint| endpoint.node_id == node_id)
    }

    /// Fetch the link and overwrite local fields with the server's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] without a connector, project id or link id.
    pub async fn get(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let response: Value = connector.get(&self.path()?).await?;
        self.apply(response)
    }

    /// Create the link on the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] without a project id or endpoints; the
    /// server answers 400 unless there are exactly two endpoints and 409 when
    /// both endpoints sit on the same node.
    pub async fn create(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id()?;
        if self.nodes.is_empty() {
            return Err(Error::MissingAttribute("nodes".to_string()));
        }

        let mut body = serde_json::to_value(&*self)?;
        if let Value::Object(fields) = &mut body {
            fields.remove("project_id");
            fields.remove("link_id");
        }

        let response: Value = connector
            .post(&format!("projects/{project_id}/links"), &body)
            .await?;
        self.apply(response)
    }

    /// Update the link with the given changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if a change does not fit a field's type.
    pub async fn update<C>(&mut self, changes: &C) -> Result<()>
    where
        C: Serialize + ?Sized,
    {
        let connector = self.connector()?.clone();
        let path = self.path()?;
        let changes = serde_json::to_value(changes)?;
        merge_into(self, changes.clone())?;

        let response: Value = connector.put(&path, &changes).await?;
        self.apply(response)
    }

    /// Delete the link; the local record loses its ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        connector.delete(&self.path()?).await?;
        self.project_id = None;
        self.link_id = None;
        Ok(())
    }

    /// Start a packet capture, optionally into the named file.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn start_capture(&mut self, capture_file_name: Option<&str>) -> Result<()> {
        let body = capture_file_name.map_or_else(
            || json!({}),
            |name| json!({ "capture_file_name": name }),
        );
        self.capture_action("start_capture", &body).await
    }

    /// Stop the running packet capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stop_capture(&mut self) -> Result<()> {
        self.capture_action("stop_capture", &json!({})).await
    }

    async fn capture_action(&mut self, action: &str, body: &Value) -> Result<()> {
        let connector = self.connector()?.clone();
        let path = format!("{}/{action}", self.path()?);
        match connector.post_action(&path, Some(body)).await? {
            Some(response) => self.apply(response),
            None => self.get().await,
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

    fn path(&self) -> Result<String> {
        let project_id = self.project_id()?;
        let link_id = self
            .link_id
            .ok_or_else(|| Error::MissingAttribute("link_id".to_string()))?;
        Ok(format!("projects/{project_id}/links/{link_id}"))
    }

    fn apply(&mut self, response: Value) -> Result<()> {
        let mut updated = merge_into(self, response)?;
        updated.connector = self.connector.take();
        *self = updated;
        Ok(())
    }
}
