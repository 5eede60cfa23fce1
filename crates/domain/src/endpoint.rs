//! Endpoint URL templates.
//!
//! Dataspine endpoints are addressed by host name. A template carries
//! `{{component}}`, `{{application}}`, `{{data_product_id}}` and `{{region}}`
//! placeholders which are filled in as the identity becomes known.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigurationError, ConfigurationResult};
use crate::id::{ApplicationId, DataProductId, Region};

/// Template every endpoint falls back to.
pub const DEFAULT_ENDPOINT_URL: &str =
    "https://{{component}}{{application}}{{data_product_id}}.{{region}}.cloud.dataspine.tech";

const COMPONENT: &str = "{{component}}";
const APPLICATION: &str = "{{application}}";
const APPLICATION_ID: &str = "{{application_id}}";
const DATA_PRODUCT_ID: &str = "{{data_product_id}}";
const REGION: &str = "{{region}}";

/// Platform service an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Data ingestion.
    Ingest,
    /// Data outlet.
    Outlet,
    /// Management API.
    Api,
    /// Security token service.
    Sts,
}

impl Component {
    /// Host-name prefix of the component.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Ingest => "ing",
            Self::Outlet => "out",
            Self::Api => "api",
            Self::Sts => "sts",
        }
    }
}

/// An endpoint URL with unresolved placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    /// Wraps a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Returns the raw template.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fills in component, region and application, leaving the data
    /// product placeholder for later.
    #[must_use]
    pub fn bind(
        &self,
        component: Component,
        region: &Region,
        application_id: Option<&ApplicationId>,
    ) -> Self {
        let application = application_id.map(ApplicationId::segment).unwrap_or_default();
        Self(
            self.0
                .replace(COMPONENT, component.prefix())
                .replace(APPLICATION_ID, &application)
                .replace(APPLICATION, &application)
                .replace(REGION, region.as_str()),
        )
    }

    /// Renders the final URL for an optional data product.
    ///
    /// Without a data product the placeholder is dropped, which is how the
    /// STS endpoint is addressed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendered string is not an absolute URL.
    pub fn render(&self, data_product_id: Option<&DataProductId>) -> ConfigurationResult<String> {
        let segment = data_product_id.map(DataProductId::segment).unwrap_or_default();
        let rendered = self.0.replace(DATA_PRODUCT_ID, &segment);
        Url::parse(&rendered).map_err(|e| ConfigurationError::InvalidEndpoint {
            url: rendered.clone(),
            message: e.to_string(),
        })?;
        Ok(rendered.trim_end_matches('/').to_string())
    }

    /// Binds and renders in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendered string is not an absolute URL.
    pub fn resolve(
        &self,
        component: Component,
        region: &Region,
        application_id: Option<&ApplicationId>,
        data_product_id: Option<&DataProductId>,
    ) -> ConfigurationResult<String> {
        self.bind(component, region, application_id)
            .render(data_product_id)
    }
}

impl Default for EndpointTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT_URL)
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn region() -> Region {
        Region::parse("eu-west-1").unwrap()
    }

    #[test]
    fn test_sts_endpoint_drops_data_product() {
        let app = ApplicationId::parse("00000000-0000-0000-0000-000000000001").unwrap();
        let url = EndpointTemplate::default()
            .resolve(Component::Sts, &region(), Some(&app), None)
            .unwrap();
        assert_eq!(
            url,
            "https://sts-aaaaaaaaaaaaaaaaaaaaaaaaae.eu-west-1.cloud.dataspine.tech"
        );
    }

    #[test]
    fn test_component_endpoint_with_data_product() {
        let product = DataProductId::parse("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        let url = EndpointTemplate::default()
            .resolve(Component::Ingest, &region(), None, Some(&product))
            .unwrap();
        assert_eq!(
            url,
            "https://ing-n6lbt74lq3ibdnbnadae7sle74.eu-west-1.cloud.dataspine.tech"
        );
    }

    #[test]
    fn test_bound_template_keeps_data_product_placeholder() {
        let bound = EndpointTemplate::default().bind(Component::Outlet, &region(), None);
        assert_eq!(
            bound.as_str(),
            "https://out{{data_product_id}}.eu-west-1.cloud.dataspine.tech"
        );
        assert_eq!(
            bound.render(None).unwrap(),
            "https://out.eu-west-1.cloud.dataspine.tech"
        );
    }

    #[test]
    fn test_application_id_placeholder_alias() {
        let app = ApplicationId::parse("00000000-0000-0000-0000-000000000001").unwrap();
        let template = EndpointTemplate::new("http://localhost:8080/{{component}}{{application_id}}/");
        assert_eq!(
            template
                .resolve(Component::Api, &region(), Some(&app), None)
                .unwrap(),
            "http://localhost:8080/api-aaaaaaaaaaaaaaaaaaaaaaaaae"
        );
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let err = EndpointTemplate::new("not a url {{region}}")
            .resolve(Component::Api, &region(), None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidEndpoint { .. }));
    }
}
