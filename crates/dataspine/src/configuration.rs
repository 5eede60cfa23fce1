//! Immutable client configuration.

use std::sync::Arc;

use dataspine_application::{TokenProvider, TokenProviderFactory};
use dataspine_domain::{
    ApplicationId, BehaviorVersion, Component, ConfigurationError, ConfigurationResult,
    DataProductId, EndpointTemplate, Region, TokenIdentity,
};

/// Endpoint templates per platform component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Ingest endpoint template.
    pub ingest: EndpointTemplate,
    /// Outlet endpoint template.
    pub outlet: EndpointTemplate,
    /// Management API endpoint template.
    pub api: EndpointTemplate,
    /// STS endpoint template.
    pub sts: EndpointTemplate,
}

impl ServiceEndpoints {
    /// Template of `component`.
    #[must_use]
    pub const fn template(&self, component: Component) -> &EndpointTemplate {
        match component {
            Component::Ingest => &self.ingest,
            Component::Outlet => &self.outlet,
            Component::Api => &self.api,
            Component::Sts => &self.sts,
        }
    }
}

/// Validated client configuration.
///
/// Built by [`ConfigLoader::build`](crate::ConfigLoader::build) and read-only
/// afterwards. Cloning is cheap and clones share the factory's wiring.
#[derive(Debug, Clone)]
pub struct Configuration {
    behavior_version: BehaviorVersion,
    region: Option<Region>,
    application_id: Option<ApplicationId>,
    client_name: Option<String>,
    endpoint_url: EndpointTemplate,
    endpoints: ServiceEndpoints,
    verify_tls: bool,
    factory: Arc<TokenProviderFactory>,
}

impl Configuration {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        behavior_version: BehaviorVersion,
        region: Option<Region>,
        application_id: Option<ApplicationId>,
        client_name: Option<String>,
        endpoint_url: EndpointTemplate,
        endpoints: ServiceEndpoints,
        verify_tls: bool,
        factory: TokenProviderFactory,
    ) -> Self {
        Self {
            behavior_version,
            region,
            application_id,
            client_name,
            endpoint_url,
            endpoints,
            verify_tls,
            factory: Arc::new(factory),
        }
    }

    /// Behavior version the client was built for.
    #[must_use]
    pub const fn behavior_version(&self) -> BehaviorVersion {
        self.behavior_version
    }

    /// Default region, if one was configured.
    #[must_use]
    pub const fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Default application id, if one was configured.
    #[must_use]
    pub const fn application_id(&self) -> Option<&ApplicationId> {
        self.application_id.as_ref()
    }

    /// Client name, if one was configured.
    #[must_use]
    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// The base endpoint template.
    #[must_use]
    pub const fn endpoint_url(&self) -> &EndpointTemplate {
        &self.endpoint_url
    }

    /// Per-component endpoint templates.
    #[must_use]
    pub const fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// Whether the STS certificate is verified.
    #[must_use]
    pub const fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// The factory building token providers for this configuration.
    #[must_use]
    pub fn token_provider_factory(&self) -> &TokenProviderFactory {
        &self.factory
    }

    /// Build a token provider for an explicit identity.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any part of the identity is
    /// malformed.
    pub fn create_token_provider(
        &self,
        region: &str,
        data_product_id: &str,
        application_id: &str,
    ) -> ConfigurationResult<Arc<dyn TokenProvider>> {
        self.factory
            .create_token_provider(region, data_product_id, application_id)
    }

    /// Build a token provider for a data product of the configured region
    /// and application.
    ///
    /// # Errors
    ///
    /// Returns an error if no default region or application id is
    /// configured, or if `data_product_id` is malformed.
    pub fn token_provider_for(
        &self,
        data_product_id: &str,
    ) -> ConfigurationResult<Arc<dyn TokenProvider>> {
        let identity = TokenIdentity::new(
            self.default_region()?.clone(),
            self.default_application_id()?.clone(),
            DataProductId::parse(data_product_id)?,
        );
        self.factory.create_token_provider_for(identity)
    }

    /// Endpoint of `component` for the configured region and application.
    ///
    /// The data product is ignored for the STS, which is addressed per
    /// application.
    ///
    /// # Errors
    ///
    /// Returns an error if no default region is configured or the template
    /// does not render to a valid URL.
    pub fn endpoint(
        &self,
        component: Component,
        data_product_id: Option<&DataProductId>,
    ) -> ConfigurationResult<String> {
        let data_product_id = match component {
            Component::Sts => None,
            _ => data_product_id,
        };
        self.endpoints.template(component).resolve(
            component,
            self.default_region()?,
            self.application_id.as_ref(),
            data_product_id,
        )
    }

    /// Render every template once the region is known, so a broken
    /// template fails at build time rather than on first use.
    pub(crate) fn validate_endpoints(&self) -> ConfigurationResult<()> {
        if self.region.is_none() {
            return Ok(());
        }
        for component in [
            Component::Ingest,
            Component::Outlet,
            Component::Api,
            Component::Sts,
        ] {
            self.endpoint(component, None)?;
        }
        Ok(())
    }

    fn default_region(&self) -> ConfigurationResult<&Region> {
        self.region.as_ref().ok_or(ConfigurationError::MissingRegion)
    }

    fn default_application_id(&self) -> ConfigurationResult<&ApplicationId> {
        self.application_id
            .as_ref()
            .ok_or(ConfigurationError::MissingApplicationId)
    }
}
