//! Azure cloud environments
//!
//! Each sovereign cloud has its own Resource Manager endpoint and Microsoft
//! Entra authority host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CloudEnvironment {
    #[default]
    AzurePublicCloud,
    AzureChinaCloud,
    AzureUSGovernmentCloud,
}

impl CloudEnvironment {
    pub fn resource_manager_endpoint(self) -> &'static str {
        match self {
            CloudEnvironment::AzurePublicCloud => "https://management.azure.com",
            CloudEnvironment::AzureChinaCloud => "https://management.chinacloudapi.cn",
            CloudEnvironment::AzureUSGovernmentCloud => "https://management.usgovcloudapi.net",
        }
    }

    pub fn authority_host(self) -> &'static str {
        match self {
            CloudEnvironment::AzurePublicCloud => "https://login.microsoftonline.com",
            CloudEnvironment::AzureChinaCloud => "https://login.chinacloudapi.cn",
            CloudEnvironment::AzureUSGovernmentCloud => "https://login.microsoftonline.us",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CloudEnvironment::AzurePublicCloud => "AzurePublicCloud",
            CloudEnvironment::AzureChinaCloud => "AzureChinaCloud",
            CloudEnvironment::AzureUSGovernmentCloud => "AzureUSGovernmentCloud",
        }
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CloudEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the canonical names and the short forms the az CLI uses
        match s.trim().to_ascii_lowercase().as_str() {
            "azurepubliccloud" | "azurecloud" | "public" => Ok(CloudEnvironment::AzurePublicCloud),
            "azurechinacloud" | "china" => Ok(CloudEnvironment::AzureChinaCloud),
            "azureusgovernmentcloud" | "azureusgovernment" | "usgovernment" => {
                Ok(CloudEnvironment::AzureUSGovernmentCloud)
            },
            other => Err(anyhow::anyhow!("Unknown Azure cloud environment: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_environment_names() {
        assert_eq!(
            "AzurePublicCloud".parse::<CloudEnvironment>().unwrap(),
            CloudEnvironment::AzurePublicCloud
        );
        assert_eq!(
            "azurechinacloud".parse::<CloudEnvironment>().unwrap(),
            CloudEnvironment::AzureChinaCloud
        );
        assert_eq!(
            "AzureUSGovernment".parse::<CloudEnvironment>().unwrap(),
            CloudEnvironment::AzureUSGovernmentCloud
        );
        assert!("mars".parse::<CloudEnvironment>().is_err());
    }

    #[test]
    fn test_default_is_public_cloud() {
        let env = CloudEnvironment::default();
        assert_eq!(env.resource_manager_endpoint(), "https://management.azure.com");
        assert_eq!(env.to_string(), "AzurePublicCloud");
    }
}
