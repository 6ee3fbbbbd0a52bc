//! AWS Secrets Manager store client.
//!
//! ## Credentials
//!
//! - Static: `store.access_key_id` and `store.secret_access_key`, with an
//!   optional `store.session_token`
//! - Otherwise the SDK's default provider chain, using `store.profile_name`
//!   when set (environment, shared config files, container and instance roles)
//!
//! Construction resolves credentials once and fails with a configuration error
//! if none can be found, so a misconfigured host stops at startup rather than
//! on its first secret read.
//!
//! ## Errors
//!
//! Service error codes are classified by [`ErrorKind::from_store_code`].
//! A version without `SecretString` (binary-only) is `InvalidState`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_secretsmanager::config::{Credentials, Region};
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_secretsmanager::Client;
use tracing::{debug, info};

use super::client::{validate_name, SecretsClient};
use super::error::{ErrorKind, Result, RetrievalError};
use super::stage::VersionStage;
use super::types::SecretString;
use crate::config::StoreConfig;
use crate::errors::Error;

/// Non-caching AWS Secrets Manager client: one `GetSecretValue` call per read.
pub struct AwsSecretsManagerClient {
    client: Client,
    region: String,
}

impl std::fmt::Debug for AwsSecretsManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerClient")
            .field("region", &self.region)
            .field("client", &"[SecretsManager]")
            .finish()
    }
}

impl AwsSecretsManagerClient {
    /// Build a client from store settings.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when no region or no credentials can be resolved.
    pub async fn from_config(config: &StoreConfig) -> crate::Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region_name {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile_name {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.expose_secret().to_string(),
                config.session_token.as_ref().map(|token| token.expose_secret().to_string()),
                None,
                "secrets-cache-static",
            ));
        }

        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|region| region.to_string())
            .ok_or_else(|| Error::config("No AWS region configured; set store.region_name"))?;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::config("No AWS credentials provider available"))?;
        provider.provide_credentials().await.map_err(|e| {
            Error::config(format!(
                "Unable to resolve AWS credentials: {}",
                DisplayErrorContext(&e)
            ))
        })?;

        info!(
            region = %region,
            profile = config.profile_name.as_deref().unwrap_or("<default>"),
            static_credentials = config.has_static_credentials(),
            "Initialized AWS Secrets Manager client"
        );

        Ok(Self { client: Client::new(&sdk_config), region })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl SecretsClient for AwsSecretsManagerClient {
    async fn get_secret_string(&self, name: &str, stage: VersionStage) -> Result<SecretString> {
        validate_name(name)?;
        debug!(secret = %name, stage = %stage, "Fetching secret from AWS Secrets Manager");

        let response = self
            .client
            .get_secret_value()
            .secret_id(name)
            .version_stage(stage.as_str())
            .send()
            .await
            .map_err(|e| {
                let kind = ErrorKind::from_store_code(e.code());
                RetrievalError::new(kind, name, DisplayErrorContext(&e).to_string())
            })?;

        response.secret_string().map(SecretString::new).ok_or_else(|| {
            RetrievalError::invalid_state(
                name,
                format!("{} version has no string value (binary secret)", stage),
            )
        })
    }
}
