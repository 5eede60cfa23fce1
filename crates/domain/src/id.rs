//! Identity types scoping a token request.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base32::Alphabet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, ConfigurationResult};

#[allow(clippy::expect_used)]
static REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex"));

/// Encodes a UUID as lowercase, unpadded RFC 4648 base32.
///
/// This is the form ids take inside Dataspine host names.
#[must_use]
pub fn uuid_to_base32(id: &Uuid) -> String {
    base32::encode(Alphabet::Rfc4648 { padding: false }, id.as_bytes()).to_lowercase()
}

fn parse_uuid(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok().filter(|id| !id.is_nil())
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $error:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wraps a UUID, rejecting the nil UUID.
            ///
            /// # Errors
            ///
            /// Returns an error if `id` is nil.
            pub fn new(id: Uuid) -> ConfigurationResult<Self> {
                if id.is_nil() {
                    return Err(ConfigurationError::$error(id.to_string()));
                }
                Ok(Self(id))
            }

            /// Parses the textual UUID form.
            ///
            /// # Errors
            ///
            /// Returns an error if `value` is not a non-nil UUID.
            pub fn parse(value: &str) -> ConfigurationResult<Self> {
                parse_uuid(value)
                    .map(Self)
                    .ok_or_else(|| ConfigurationError::$error(value.to_string()))
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the host-name segment for this id (`-` + base32).
            #[must_use]
            pub fn segment(&self) -> String {
                format!("-{}", uuid_to_base32(&self.0))
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Globally unique id of a consuming application.
    ApplicationId,
    InvalidApplicationId
);

uuid_id!(
    /// Globally unique id of a data product.
    DataProductId,
    InvalidDataProductId
);

/// Dataspine region identifier, e.g. `eu-west-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Validates and wraps a region identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is empty or contains anything other
    /// than lowercase alphanumerics separated by single dashes.
    pub fn parse(value: &str) -> ConfigurationResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigurationError::MissingRegion);
        }
        if !REGION_PATTERN.is_match(value) {
            return Err(ConfigurationError::InvalidRegion(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Region {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Region {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (region, application, data product) triple a token provider is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenIdentity {
    /// Region of the platform deployment.
    pub region: Region,
    /// Consuming application.
    pub application_id: ApplicationId,
    /// Data product the token is scoped to.
    pub data_product_id: DataProductId,
}

impl TokenIdentity {
    /// Creates an identity from already validated parts.
    #[must_use]
    pub const fn new(
        region: Region,
        application_id: ApplicationId,
        data_product_id: DataProductId,
    ) -> Self {
        Self {
            region,
            application_id,
            data_product_id,
        }
    }

    /// Parses and validates all three parts.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, checked in region, data product,
    /// application order.
    pub fn parse(
        region: &str,
        data_product_id: &str,
        application_id: &str,
    ) -> ConfigurationResult<Self> {
        let region = Region::parse(region)?;
        let data_product_id = DataProductId::parse(data_product_id)?;
        let application_id = ApplicationId::parse(application_id)?;
        Ok(Self::new(region, application_id, data_product_id))
    }
}

impl fmt::Display for TokenIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.region, self.application_id, self.data_product_id
        )
    }
}
