//! Shared fixtures for the mock-server tests of this crate.

use crate::connector::Gns3Connector;
use gns3_core::client::RetryPolicy;
use gns3_core::uuid::{LinkId, NodeId, ProjectId, TemplateId};
use serde_json::Value;
use wiremock::MockServer;

pub(crate) const API_TEST_PROJECT: &str = "API_TEST";

pub(crate) fn project_id() -> ProjectId {
    ProjectId::parse_str("4b21dfb3-675a-4efa-8613-2f7fb32e76fe").unwrap()
}

/// The `alpine-1` docker node.
pub(crate) fn node_id() -> NodeId {
    NodeId::parse_str("ef503c45-e998-499d-88fc-2765614b313e").unwrap()
}

/// The `vEOS` <-> `alpine-1` link.
pub(crate) fn link_id() -> LinkId {
    LinkId::parse_str("4d9f1235-7fd1-466b-ad26-0b4b08beb778").unwrap()
}

/// The `alpine` docker template.
pub(crate) fn template_id() -> TemplateId {
    TemplateId::parse_str("847e5333-6ac9-411f-a400-89838584371b").unwrap()
}

pub(crate) fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let raw = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn find_in(name: &str, key: &str, id: &str) -> Value {
    fixture(name)
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry[key] == id)
        .cloned()
        .unwrap()
}

pub(crate) fn api_test_project_json() -> Value {
    find_in("projects.json", "project_id", &project_id().to_string())
}

pub(crate) fn alpine_node_json() -> Value {
    find_in("nodes.json", "node_id", &node_id().to_string())
}

pub(crate) fn node_json(name: &str) -> Value {
    find_in("nodes.json", "name", name)
}

pub(crate) fn alpine_link_json() -> Value {
    find_in("links.json", "link_id", &link_id().to_string())
}

pub(crate) fn alpine_template_json() -> Value {
    find_in("templates.json", "template_id", &template_id().to_string())
}

/// Connector pointed at a mock server, without retries.
pub(crate) fn mock_connector(server: &MockServer) -> Gns3Connector {
    Gns3Connector::builder(server.uri())
        .with_retry_policy(RetryPolicy::no_retry())
        .build()
        .unwrap()
}
