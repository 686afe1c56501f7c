//! Template entity: the blueprint nodes are instantiated from.

use crate::connector::{require_keys, Gns3Connector};
use crate::hydrate::merge_into;
use crate::Result;
use gns3_core::types::{NodeType, TemplateCategory};
use gns3_core::uuid::TemplateId;
use gns3_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GNS3 template.
///
/// Only the fields shared by every template type are typed; the emulator specific
/// settings (image, RAM, adapters, ...) live in [`Template::properties`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    /// Template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category the template is listed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TemplateCategory>,
    /// Type of node the template creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<NodeType>,
    /// Whether the template ships with the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<bool>,
    /// Compute the template runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_id: Option<String>,
    /// Symbol path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Name format for nodes created from the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_name_format: Option<String>,
    /// Free-form usage notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Type specific settings.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    #[serde(skip)]
    connector: Option<Gns3Connector>,
}

impl Template {
    /// Create an empty template record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for the template called `name`.
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

    /// Fetch the template by id, or by name when no id is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id or name.
    pub async fn get(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let template_id = self.template_id().await?;
        let response: Value = connector.get(&format!("templates/{template_id}")).await?;
        self.apply(response)
    }

    /// Create the template on the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without `name` or `template_type`.
    pub async fn create(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let mut body = serde_json::to_value(&*self)?;
        require_keys(&body, &["name", "template_type"])?;
        if let Value::Object(fields) = &mut body {
            fields.remove("template_id");
        }

        let response: Value = connector.post("templates", &body).await?;
        self.apply(response)
    }

    /// Update the template with the given changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if a change does not fit a field's type.
    pub async fn update<C>(&mut self, changes: &C) -> Result<()>
    where
        C: Serialize + ?Sized,
    {
        let connector = self.connector()?.clone();
        let template_id = self.template_id().await?;
        let changes = serde_json::to_value(changes)?;
        merge_into(self, changes.clone())?;

        let response: Value = connector
            .put(&format!("templates/{template_id}"), &changes)
            .await?;
        self.apply(response)
    }

    /// Delete the template; the local record loses its id and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&mut self) -> Result<()> {
        let connector = self.connector()?.clone();
        let template_id = self.template_id().await?;
        connector.delete_template(template_id).await?;
        self.template_id = None;
        self.name = None;
        Ok(())
    }

    fn connector(&self) -> Result<&Gns3Connector> {
        self.connector
            .as_ref()
            .ok_or_else(|| Error::MissingAttribute("connector".to_string()))
    }

    async fn template_id(&mut self) -> Result<TemplateId> {
        if let Some(template_id) = self.template_id {
            return Ok(template_id);
        }

        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::MissingAttribute("template_id or name".to_string()))?;
        let template_id = self
            .connector()?
            .get_template_by_name(&name)
            .await?
            .and_then(|template| template.template_id)
            .ok_or_else(|| Error::NotFound(format!("Template `{name}` not found")))?;

        self.template_id = Some(template_id);
        Ok(template_id)
    }

    fn apply(&mut self, response: Value) -> Result<()> {
        let mut updated = merge_into(self, response)?;
        updated.connector = self.connector.take();
        *self = updated;
        Ok(())
    }
}
