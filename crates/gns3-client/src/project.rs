//! Project entity and the orchestration spanning its nodes and links.

use crate::connector::{require_keys, Gns3Connector};
use crate::hydrate::merge_into;
use crate::link::Link;
use crate::models::{InventoryEntry, LinkEndpoint, LinkSummary, NodeSummary, ProjectStats, Snapshot};
use crate::node::Node;
use crate::Result;
use gns3_core::types::ProjectStatus;
use gns3_core::uuid::{LinkId, NodeId, ProjectId, SnapshotId};
use gns3_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::mem;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A GNS3 project.
///
/// Besides the server record, a project caches its stats, nodes, links and
/// snapshots; those are only filled by the matching `get_*` calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Project name, unique on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Open state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    /// Directory of the project on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Project file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Start every node when the project opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    /// Close the project when no client is connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_close: Option<bool>,
    /// Open the project when the server starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_open: Option<bool>,
    /// Drawing grid size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_grid_size: Option<u32>,
    /// Node grid size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<u32>,
    /// Scene height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_height: Option<u32>,
    /// Scene width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_width: Option<u32>,
    /// Show the grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    /// Show interface labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_interface_labels: Option<bool>,
    /// Show layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_layers: Option<bool>,
    /// Snap items to the grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_to_grid: Option<bool>,
    /// Supplier logo and URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Value>,
    /// Variables exposed to nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    /// Canvas zoom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
    /// Object counts, filled by [`Project::get_stats`].
    #[serde(skip)]
    pub stats: Option<ProjectStats>,
    /// Nodes, filled by [`Project::get_nodes`].
    #[serde(skip)]
    pub nodes: Vec<Node>,
    /// Links, filled by [`Project::get_links`].
    #[serde(skip)]
    pub links: Vec<Link>,
    /// Snapshots, filled by [`Project::get_snapshots`].
    #[serde(skip)]
    pub snapshots: Vec<Snapshot>,
    #[serde(skip)]
    connector: Option<Gns3Connector>,
}

impl Project {
    /// Create an empty project record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for the project called `name`.
    ///
    /// The id is looked up by name on the first server call.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Attach the connector used for server calls.
    #[must_use]
    pub fn with_connector(mut self, connector: Gns3Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Fetch the project record, resolving the id by name when needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] without a connector, or without both
    /// id and name, and [`Error::NotFound`] for an unknown project.
    pub async fn refresh(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        let response: Value = connector.get(&format!("projects/{project_id}")).await?;
        self.apply(response)
    }

    /// Fetch the project record with its stats, nodes and links.
    ///
    /// # Errors
    ///
    /// See [`Project::refresh`].
    pub async fn get(&mut self) -> Result<()> {
        self.refresh().await?;
        self.get_stats().await?;
        self.get_nodes().await?;
        self.get_links().await
    }

    /// Create the project on the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without a name and [`Error::Conflict`]
    /// if the name is taken.
    pub async fn create(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let body = serde_json::to_value(&*self)?;
        require_keys(&body, &["name"])?;

        let response: Value = connector.post("projects", &body).await?;
        self.apply(response)
    }

    /// Update the project with the given changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if a change does not fit a field's type.
    pub async fn update<C>(&mut self, changes: &C) -> Result<()>
    where
        C: Serialize + ?Sized,
    {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        let changes = serde_json::to_value(changes)?;
        merge_into(self, changes.clone())?;

        let response: Value = connector
            .put(&format!("projects/{project_id}"), &changes)
            .await?;
        self.apply(response)
    }

    /// Delete the project; the local record loses its id and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        connector.delete_project(project_id).await?;
        self.project_id = None;
        self.name = None;
        Ok(())
    }

    /// Open the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn open(&mut self) -> Result<()> {
        self.action("open").await
    }

    /// Close the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn close(&mut self) -> Result<()> {
        self.action("close").await
    }

    /// Fetch the project's object counts into [`Project::stats`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_stats(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.stats = Some(connector.get(&format!("projects/{project_id}/stats")).await?);
        Ok(())
    }

    /// Fetch the project's nodes into [`Project::nodes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_nodes(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.nodes = connector.get_nodes(project_id).await?;
        Ok(())
    }

    /// Fetch the project's links into [`Project::links`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_links(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.links = connector.get_links(project_id).await?;
        Ok(())
    }

    /// Start every node, wait `poll_wait`, then refetch the nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails.
    pub async fn start_nodes(&mut self, poll_wait: Duration) -> Result<()> {
        self.nodes_action("start", poll_wait).await
    }

    /// Stop every node, wait `poll_wait`, then refetch the nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails.
    pub async fn stop_nodes(&mut self, poll_wait: Duration) -> Result<()> {
        self.nodes_action("stop", poll_wait).await
    }

    /// Reload every node, wait `poll_wait`, then refetch the nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails.
    pub async fn reload_nodes(&mut self, poll_wait: Duration) -> Result<()> {
        self.nodes_action("reload", poll_wait).await
    }

    /// Suspend every node, wait `poll_wait`, then refetch the nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails.
    pub async fn suspend_nodes(&mut self, poll_wait: Duration) -> Result<()> {
        self.nodes_action("suspend", poll_wait).await
    }

    /// Name, status, console port and id of every node.
    ///
    /// Nodes are fetched first if none are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be fetched.
    pub async fn nodes_summary(&mut self) -> Result<Vec<NodeSummary>> {
        self.ensure_nodes().await?;
        Ok(self
            .nodes
            .iter()
            .map(|node| NodeSummary {
                name: node.name.clone().unwrap_or_default(),
                status: node.status,
                console: node.console,
                node_id: node.node_id,
            })
            .collect())
    }

    /// Every link as node and port names.
    ///
    /// Nodes and links are fetched first if none are cached. Links whose
    /// endpoints cannot be matched to a known node port are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes or links cannot be fetched.
    pub async fn links_summary(&mut self) -> Result<Vec<LinkSummary>> {
        self.ensure_nodes().await?;
        if self.links.is_empty() {
            self.get_links().await?;
        }

        let mut summary = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let [side_a, side_b] = link.nodes.as_slice() else {
                warn!(link_id = ?link.link_id, "Skipping link without exactly two endpoints");
                continue;
            };

            match (self.describe_endpoint(side_a), self.describe_endpoint(side_b)) {
                (Some((node_a, port_a)), Some((node_b, port_b))) => summary.push(LinkSummary {
                    node_a,
                    port_a,
                    node_b,
                    port_b,
                }),
                _ => warn!(link_id = ?link.link_id, "Skipping link with unresolved endpoint"),
            }
        }
        Ok(summary)
    }

    /// Console access details keyed by node name.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be fetched.
    pub async fn nodes_inventory(&mut self) -> Result<BTreeMap<String, InventoryEntry>> {
        let server = self.connector()?.server_host().to_string();
        self.ensure_nodes().await?;

        Ok(self
            .nodes
            .iter()
            .filter_map(|node| {
                let name = node.name.clone()?;
                let entry = InventoryEntry {
                    server: server.clone(),
                    name: name.clone(),
                    console_port: node.console,
                    node_type: node.node_type,
                };
                Some((name, entry))
            })
            .collect())
    }

    /// Node with the given name, fetching nodes if none are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be fetched.
    pub async fn get_node_by_name(&mut self, name: &str) -> Result<Option<Node>> {
        self.ensure_nodes().await?;
        Ok(self
            .nodes
            .iter()
            .find(|node| node.name.as_deref() == Some(name))
            .cloned())
    }

    /// Node with the given id, fetching nodes if none are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the nodes cannot be fetched.
    pub async fn get_node_by_id(&mut self, node_id: NodeId) -> Result<Option<Node>> {
        self.ensure_nodes().await?;
        Ok(self
            .nodes
            .iter()
            .find(|node| node.node_id == Some(node_id))
            .cloned())
    }

    /// Link with the given id, fetching links if none are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the links cannot be fetched.
    pub async fn get_link_by_id(&mut self, link_id: LinkId) -> Result<Option<Link>> {
        if self.links.is_empty() {
            self.get_links().await?;
        }
        Ok(self
            .links
            .iter()
            .find(|link| link.link_id == Some(link_id))
            .cloned())
    }

    /// Create a node named `name` from the template named `template`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a node with that name already exists and
    /// [`Error::NotFound`] for an unknown template.
    pub async fn create_node(&mut self, name: &str, template: &str) -> Result<Node> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.get_nodes().await?;

        if self.nodes.iter().any(|node| node.name.as_deref() == Some(name)) {
            return Err(Error::Conflict(format!("Node with name `{name}` already exists")));
        }

        let mut node = Node::in_project(project_id, name).with_connector(connector);
        node.template = Some(template.to_string());
        node.create_from_template().await?;

        self.get_nodes().await?;
        Ok(node)
    }

    /// Link `port_a` of `node_a` to `port_b` of `node_b`, ports given by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown node or port and
    /// [`Error::Conflict`] if either port already carries a link.
    pub async fn create_link(
        &mut self,
        node_a: &str,
        port_a: &str,
        node_b: &str,
        port_b: &str,
    ) -> Result<Link> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.get_nodes().await?;
        self.get_links().await?;

        let endpoints = vec![
            self.free_endpoint(node_a, port_a)?,
            self.free_endpoint(node_b, port_b)?,
        ];

        let mut link = Link::in_project(project_id, endpoints).with_connector(connector);
        link.create().await?;

        self.get_links().await?;
        Ok(link)
    }

    /// Fetch the project's snapshots into [`Project::snapshots`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_snapshots(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        self.snapshots = connector
            .get(&format!("projects/{project_id}/snapshots"))
            .await?;
        Ok(())
    }

    /// Snapshot the project under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a snapshot with that name exists.
    pub async fn create_snapshot(&mut self, name: &str) -> Result<Snapshot> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        let snapshot: Snapshot = connector
            .post(
                &format!("projects/{project_id}/snapshots"),
                &json!({ "name": name }),
            )
            .await?;

        self.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Delete a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown snapshot.
    pub async fn delete_snapshot(&mut self, snapshot_id: SnapshotId) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        connector
            .delete(&format!("projects/{project_id}/snapshots/{snapshot_id}"))
            .await?;

        self.snapshots
            .retain(|snapshot| snapshot.snapshot_id != snapshot_id);
        Ok(())
    }

    /// Restore a snapshot; the project record is replaced by the restored one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown snapshot.
    pub async fn restore_snapshot(&mut self, snapshot_id: SnapshotId) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        let path = format!("projects/{project_id}/snapshots/{snapshot_id}/restore");
        match connector.post_action(&path, Some(&json!({}))).await? {
            Some(response) => self.apply(response),
            None => self.refresh().await,
        }
    }

    async fn action(&mut self, action: &str) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        let path = format!("projects/{project_id}/{action}");
        match connector.post_action::<Value>(&path, None).await? {
            Some(response) => self.apply(response),
            None => self.refresh().await,
        }
    }

    async fn nodes_action(&mut self, action: &str, poll_wait: Duration) -> Result<()> {
        let connector = self.connector()?.clone();
        let project_id = self.project_id().await?;
        connector
            .post_action::<Value>(&format!("projects/{project_id}/nodes/{action}"), None)
            .await?;

        if !poll_wait.is_zero() {
            debug!(action, ?poll_wait, "Waiting for nodes to settle");
            sleep(poll_wait).await;
        }
        self.get_nodes().await
    }

    async fn ensure_nodes(&mut self) -> Result<()> {
        if self.nodes.is_empty() {
            self.get_nodes().await?;
        }
        Ok(())
    }

    fn describe_endpoint(&self, endpoint: &LinkEndpoint) -> Option<(String, String)> {
        let node = self
            .nodes
            .iter()
            .find(|node| node.node_id == Some(endpoint.node_id))?;
        let port = node.port_at(endpoint.adapter_number, endpoint.port_number)?;
        Some((node.name.clone()?, port.name.clone()))
    }

    fn free_endpoint(&self, node_name: &str, port_name: &str) -> Result<LinkEndpoint> {
        let node = self
            .nodes
            .iter()
            .find(|node| node.name.as_deref() == Some(node_name))
            .ok_or_else(|| Error::NotFound(format!("Node `{node_name}` not found")))?;
        let node_id = node
            .node_id
            .ok_or_else(|| Error::MissingAttribute("node_id".to_string()))?;
        let port = node.port_named(port_name).ok_or_else(|| {
            Error::NotFound(format!("Port `{port_name}` not found on node `{node_name}`"))
        })?;

        let in_use = self.links.iter().flat_map(|link| &link.nodes).any(|endpoint| {
            endpoint.node_id == node_id
                && endpoint.is_port(port.adapter_number, port.port_number)
        });
        if in_use {
            return Err(Error::Conflict(format!(
                "Port `{port_name}` of node `{node_name}` is already in use"
            )));
        }

        Ok(LinkEndpoint::new(
            node_id,
            port.adapter_number,
            port.port_number,
        ))
    }

    fn connector(&self) -> Result<&Gns3Connector> {
        self.connector
            .as_ref()
            .ok_or_else(|| Error::MissingAttribute("connector".to_string()))
    }

    async fn project_id(&mut self) -> Result<ProjectId> {
        if let Some(project_id) = self.project_id {
            return Ok(project_id);
        }

        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::MissingAttribute("project_id or name".to_string()))?;
        let project_id = self
            .connector()?
            .get_project_by_name(&name)
            .await?
            .and_then(|project| project.project_id)
            .ok_or_else(|| Error::NotFound(format!("Project `{name}` not found")))?;

        self.project_id = Some(project_id);
        Ok(project_id)
    }

    fn apply(&mut self, response: Value) -> Result<()> {
        let mut updated = merge_into(self, response)?;
        updated.connector = self.connector.take();
        updated.stats = self.stats.take();
        updated.nodes = mem::take(&mut self.nodes);
        updated.links = mem::take(&mut self.links);
        updated.snapshots = mem::take(&mut self.snapshots);
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        api_test_project_json, fixture, link_id, mock_connector, node_id, node_json, project_id,
        template_id, API_TEST_PROJECT,
    };
    use gns3_core::types::{NodeStatus, NodeType};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project_path() -> String {
        format!("/v2/projects/{}", project_id())
    }

    async fn mount_project_reads(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixture("projects.json")))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(project_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_test_project_json()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/stats", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "drawings": 0, "links": 4, "nodes": 6, "snapshots": 0
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/nodes", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixture("nodes.json")))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/links", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixture("links.json")))
            .mount(server)
            .await;
    }

    fn api_test(server: &MockServer) -> Project {
        Project::named(API_TEST_PROJECT).with_connector(mock_connector(server))
    }

    async fn fetched_api_test(server: &MockServer) -> Project {
        mount_project_reads(server).await;
        let mut project = api_test(server);
        project.get().await.unwrap();
        project
    }

    #[test]
    fn test_instantiation_from_fixture() {
        let projects: Vec<Project> = serde_json::from_value(fixture("projects.json")).unwrap();
        assert_eq!(projects[0].name.as_deref(), Some("test2"));
        assert_eq!(projects[0].status, Some(ProjectStatus::Closed));
        assert_eq!(projects[1].auto_close, Some(false));
        assert!(projects[1].nodes.is_empty());
        assert!(projects[1].stats.is_none());
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/projects"))
            .and(body_json(json!({"name": API_TEST_PROJECT})))
            .respond_with(ResponseTemplate::new(201).set_body_json(api_test_project_json()))
            .mount(&server)
            .await;

        let mut project = api_test(&server);
        project.create().await.unwrap();

        assert_eq!(project.project_id, Some(project_id()));
        assert_eq!(project.status, Some(ProjectStatus::Opened));
        assert_eq!(project.auto_close, Some(false));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let server = MockServer::start().await;
        let mut project = Project::new().with_connector(mock_connector(&server));
        let err = project.create().await.unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError("Parameter 'name' is mandatory".to_string())
        );
    }

    #[tokio::test]
    async fn test_requires_connector() {
        let mut project = Project::named(API_TEST_PROJECT);
        let err = project.get().await.unwrap_err();
        assert_eq!(err, Error::MissingAttribute("connector".to_string()));
    }

    #[tokio::test]
    async fn test_requires_id_or_name() {
        let server = MockServer::start().await;
        let mut project = Project::new().with_connector(mock_connector(&server));
        let err = project.open().await.unwrap_err();
        assert_eq!(
            err,
            Error::MissingAttribute("project_id or name".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        mount_project_reads(&server).await;
        Mock::given(method("DELETE"))
            .and(path(project_path()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut project = api_test(&server);
        project.delete().await.unwrap();
        assert!(project.project_id.is_none());
        assert!(project.name.is_none());
    }

    #[tokio::test]
    async fn test_get() {
        let server = MockServer::start().await;
        let project = fetched_api_test(&server).await;

        assert_eq!(project.name.as_deref(), Some(API_TEST_PROJECT));
        assert_eq!(project.status, Some(ProjectStatus::Opened));
        assert_eq!(
            project.stats,
            Some(ProjectStats {
                drawings: 0,
                links: 4,
                nodes: 6,
                snapshots: 0
            })
        );
        assert_eq!(project.nodes.len(), 6);
        assert_eq!(project.links.len(), 5);
    }

    #[tokio::test]
    async fn test_get_unknown_name() {
        let server = MockServer::start().await;
        mount_project_reads(&server).await;

        let mut project = Project {
            name: Some("missing".to_string()),
            ..Project::new()
        }
        .with_connector(mock_connector(&server));
        let err = project.refresh().await.unwrap_err();
        assert_eq!(err, Error::NotFound("Project `missing` not found".to_string()));
    }

    #[tokio::test]
    async fn test_update_keeps_cached_state() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;
        let mut updated = api_test_project_json();
        updated["filename"] = json!("file_updated.gns3");
        Mock::given(method("PUT"))
            .and(path(project_path()))
            .and(body_json(json!({"filename": "file_updated.gns3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(updated))
            .mount(&server)
            .await;

        project
            .update(&json!({"filename": "file_updated.gns3"}))
            .await
            .unwrap();

        assert_eq!(project.name.as_deref(), Some(API_TEST_PROJECT));
        assert_eq!(project.status, Some(ProjectStatus::Opened));
        assert_eq!(project.filename.as_deref(), Some("file_updated.gns3"));
        assert_eq!(project.nodes.len(), 6);
        assert!(project.stats.is_some());
    }

    #[tokio::test]
    async fn test_update_rejects_bad_type_locally() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let err = project
            .update(&json!({"auto_close": "sometimes"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert_eq!(project.auto_close, Some(false));
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;
        let mut closed = api_test_project_json();
        closed["status"] = json!("closed");
        Mock::given(method("POST"))
            .and(path(format!("{}/close", project_path())))
            .respond_with(ResponseTemplate::new(201).set_body_json(closed))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/open", project_path())))
            .respond_with(ResponseTemplate::new(201).set_body_json(api_test_project_json()))
            .mount(&server)
            .await;

        project.close().await.unwrap();
        assert_eq!(project.name.as_deref(), Some(API_TEST_PROJECT));
        assert_eq!(project.status, Some(ProjectStatus::Closed));

        project.open().await.unwrap();
        assert_eq!(project.status, Some(ProjectStatus::Opened));
    }

    #[tokio::test]
    async fn test_get_nodes_and_links() {
        let server = MockServer::start().await;
        let project = fetched_api_test(&server).await;

        let expected = [
            ("Ethernetswitch-1", NodeType::EthernetSwitch),
            ("IOU1", NodeType::Iou),
            ("IOU2", NodeType::Iou),
            ("vEOS", NodeType::Qemu),
            ("alpine-1", NodeType::Docker),
            ("Cloud-1", NodeType::Cloud),
        ];
        for (node, (name, node_type)) in project.nodes.iter().zip(expected) {
            assert_eq!(node.name.as_deref(), Some(name));
            assert_eq!(node.node_type, Some(node_type));
        }
        assert_eq!(
            project.links[0].link_type,
            Some(gns3_core::types::LinkType::Ethernet)
        );
    }

    #[tokio::test]
    async fn test_stop_nodes_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/nodes/stop", project_path())))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let mut stopped = fixture("nodes.json");
        for node in stopped.as_array_mut().unwrap() {
            node["status"] = json!("stopped");
        }
        Mock::given(method("GET"))
            .and(path(format!("{}/nodes", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(stopped))
            .mount(&server)
            .await;

        let mut project = Project {
            project_id: Some(project_id()),
            ..Project::new()
        }
        .with_connector(mock_connector(&server));
        project.stop_nodes(Duration::from_millis(1)).await.unwrap();

        assert_eq!(project.nodes.len(), 6);
        assert!(project
            .nodes
            .iter()
            .all(|node| node.status == Some(NodeStatus::Stopped)));
    }

    #[tokio::test]
    async fn test_start_reload_suspend_nodes() {
        let server = MockServer::start().await;
        for action in ["start", "reload", "suspend"] {
            Mock::given(method("POST"))
                .and(path(format!("{}/nodes/{action}", project_path())))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }
        let mut suspended = fixture("nodes.json");
        for node in suspended.as_array_mut().unwrap() {
            node["status"] = json!("suspended");
        }
        Mock::given(method("GET"))
            .and(path(format!("{}/nodes", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixture("nodes.json")))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/nodes", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(suspended))
            .expect(1)
            .mount(&server)
            .await;

        let mut project = Project {
            project_id: Some(project_id()),
            ..Project::new()
        }
        .with_connector(mock_connector(&server));

        project.start_nodes(Duration::ZERO).await.unwrap();
        assert!(project
            .nodes
            .iter()
            .all(|node| node.status == Some(NodeStatus::Started)));

        project.reload_nodes(Duration::ZERO).await.unwrap();
        assert_eq!(project.nodes.len(), 6);

        project.suspend_nodes(Duration::from_millis(1)).await.unwrap();
        assert!(project
            .nodes
            .iter()
            .all(|node| node.status == Some(NodeStatus::Suspended)));
    }

    #[tokio::test]
    async fn test_nodes_summary() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let summary = project.nodes_summary().await.unwrap();
        let rows: Vec<_> = summary
            .iter()
            .map(|row| (row.name.as_str(), row.console, row.node_id.unwrap().to_string()))
            .collect();
        assert_eq!(
            rows,
            [
                ("Ethernetswitch-1", Some(5000), "da28e1c0-9465-4f7c-b42c-49b2f4e1c64d".to_string()),
                ("IOU1", Some(5001), "de23a89a-aa1f-446a-a950-31d4bf98653c".to_string()),
                ("IOU2", Some(5002), "0d10d697-ef8d-40af-a4f3-fafe71f5458b".to_string()),
                ("vEOS", Some(5003), "8283b923-df0e-4bc1-8199-be6fea40f500".to_string()),
                ("alpine-1", Some(5005), "ef503c45-e998-499d-88fc-2765614b313e".to_string()),
                ("Cloud-1", None, "cde85a31-c97f-4551-9596-a3ed12c08498".to_string()),
            ]
        );
        assert!(summary
            .iter()
            .all(|row| row.status == Some(NodeStatus::Started)));
    }

    #[tokio::test]
    async fn test_links_summary() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let summary = project.links_summary().await.unwrap();
        let rows: Vec<_> = summary
            .iter()
            .map(|row| {
                (
                    row.node_a.as_str(),
                    row.port_a.as_str(),
                    row.node_b.as_str(),
                    row.port_b.as_str(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            [
                ("IOU1", "Ethernet0/0", "Ethernetswitch-1", "Ethernet1"),
                ("IOU1", "Ethernet1/0", "IOU2", "Ethernet1/0"),
                ("vEOS", "Management1", "Ethernetswitch-1", "Ethernet0"),
                ("vEOS", "Ethernet1", "alpine-1", "eth0"),
                ("Cloud-1", "eth1", "Ethernetswitch-1", "Ethernet7"),
            ]
        );
    }

    #[tokio::test]
    async fn test_links_summary_skips_unknown_endpoints() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;
        project.links[0].nodes[0].node_id = NodeId::new_v4();
        project.links[1].nodes[1].adapter_number = 9;

        let summary = project.links_summary().await.unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].node_a, "vEOS");
    }

    #[tokio::test]
    async fn test_nodes_inventory() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let inventory = project.nodes_inventory().await.unwrap();
        assert_eq!(inventory.len(), 6);

        let iou1 = &inventory["IOU1"];
        assert_eq!(iou1.server, "127.0.0.1");
        assert_eq!(iou1.console_port, Some(5001));
        assert_eq!(iou1.node_type, Some(NodeType::Iou));
        assert_eq!(inventory["Cloud-1"].console_port, None);
    }

    #[tokio::test]
    async fn test_node_and_link_lookups() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let iou1 = project.get_node_by_name("IOU1").await.unwrap().unwrap();
        assert_eq!(iou1.status, Some(NodeStatus::Started));
        assert_eq!(iou1.console, Some(5001));

        let alpine = project.get_node_by_id(node_id()).await.unwrap().unwrap();
        assert_eq!(alpine.name.as_deref(), Some("alpine-1"));
        assert_eq!(alpine.console, Some(5005));

        let link = project.get_link_by_id(link_id()).await.unwrap().unwrap();
        assert!(link.touches(node_id()));

        assert!(project.get_node_by_name("R1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_node_rejects_duplicate_name() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let err = project.create_node("IOU1", "IOU-L3").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_node_from_template() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixture("templates.json")))
            .mount(&server)
            .await;
        let mut created = node_json("alpine-1");
        created["name"] = json!("web");
        Mock::given(method("POST"))
            .and(path(format!("{}/templates/{}", project_path(), template_id())))
            .respond_with(ResponseTemplate::new(201).set_body_json(created))
            .expect(1)
            .mount(&server)
            .await;

        let node = project.create_node("web", "alpine").await.unwrap();
        assert_eq!(node.name.as_deref(), Some("web"));
        assert_eq!(node.template_id, Some(template_id()));
    }

    #[tokio::test]
    async fn test_create_link_rejects_used_port() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;

        let err = project
            .create_link("IOU1", "Ethernet0/0", "IOU2", "Ethernet0/0")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Conflict("Port `Ethernet0/0` of node `IOU1` is already in use".to_string())
        );

        let err = project
            .create_link("IOU1", "Serial0/0", "IOU2", "Ethernet0/0")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_link() {
        let server = MockServer::start().await;
        let mut project = fetched_api_test(&server).await;
        let iou1 = node_json("IOU1")["node_id"].clone();
        let iou2 = node_json("IOU2")["node_id"].clone();
        let created = json!({
            "link_id": "0c3b6d4e-2f1a-4e5b-9c8d-7a6b5c4d3e2f",
            "link_type": "ethernet",
            "project_id": project_id(),
            "suspend": false,
            "capturing": false,
            "filters": {},
            "nodes": [
                {"node_id": iou1, "adapter_number": 0, "port_number": 1},
                {"node_id": iou2, "adapter_number": 0, "port_number": 0}
            ]
        });
        Mock::given(method("POST"))
            .and(path(format!("{}/links", project_path())))
            .and(body_json(json!({
                "nodes": [
                    {"node_id": iou1, "adapter_number": 0, "port_number": 1},
                    {"node_id": iou2, "adapter_number": 0, "port_number": 0}
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(created))
            .expect(1)
            .mount(&server)
            .await;

        let link = project
            .create_link("IOU1", "Ethernet0/1", "IOU2", "Ethernet0/0")
            .await
            .unwrap();
        assert!(link.link_id.is_some());
        assert_eq!(link.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_snapshots() {
        let server = MockServer::start().await;
        let snapshot_id = SnapshotId::parse_str("44e08d78-0ee4-4b8f-bad4-117aa67cb759").unwrap();
        let snapshot = json!({
            "snapshot_id": snapshot_id,
            "name": "baseline",
            "project_id": project_id(),
            "created_at": 1_577_836_800
        });
        Mock::given(method("GET"))
            .and(path(format!("{}/snapshots", project_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([snapshot.clone()])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/snapshots", project_path())))
            .and(body_json(json!({"name": "baseline"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(snapshot))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/snapshots/{snapshot_id}/restore", project_path())))
            .respond_with(ResponseTemplate::new(201).set_body_json(api_test_project_json()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/snapshots/{snapshot_id}", project_path())))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut project = Project {
            project_id: Some(project_id()),
            ..Project::new()
        }
        .with_connector(mock_connector(&server));

        let created = project.create_snapshot("baseline").await.unwrap();
        assert_eq!(created.snapshot_id, snapshot_id);

        project.get_snapshots().await.unwrap();
        assert_eq!(project.snapshots.len(), 1);
        assert_eq!(project.snapshots[0].name, "baseline");

        project.restore_snapshot(snapshot_id).await.unwrap();
        assert_eq!(project.name.as_deref(), Some(API_TEST_PROJECT));
        assert_eq!(project.snapshots.len(), 1);

        project.delete_snapshot(snapshot_id).await.unwrap();
        assert!(project.snapshots.is_empty());
    }
}
