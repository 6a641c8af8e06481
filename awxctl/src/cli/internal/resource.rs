use crate::{cli::Error, config::Config, deployment};

/// Resolves the namespace and AWX instance a command operates on.
pub struct ResourceResolver<'k, 'c> {
    kube_client: &'k kube::Client,
    config: &'c Config,
}

pub struct ResolvedResources {
    pub namespace: String,
    pub instance_name: String,
}

impl<'k, 'c> From<(&'k kube::Client, &'c Config)> for ResourceResolver<'k, 'c> {
    fn from((kube_client, config): (&'k kube::Client, &'c Config)) -> Self {
        Self { kube_client, config }
    }
}

impl ResourceResolver<'_, '_> {
    /// The configured namespace, or the one of the current Kubernetes context
    /// when it is empty.
    pub fn namespace(&self) -> String {
        let Self { kube_client, config } = self;
        Some(config.namespace.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| kube_client.default_namespace().to_string())
    }

    /// Resolves the namespace, then the instance within it. Without a
    /// configured instance the first `AWX` object of the namespace is used.
    ///
    /// # Errors
    ///
    /// Fails when the instance has to be looked up and the namespace holds
    /// none.
    pub async fn resolve(&self) -> Result<ResolvedResources, Error> {
        let namespace = self.namespace();
        let instance_name = deployment::resolve_instance(
            self.kube_client.clone(),
            &namespace,
            self.config.instance.clone(),
        )
        .await?;
        Ok(ResolvedResources { namespace, instance_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kube_client() -> kube::Client {
        let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
        kube::Client::try_from(config).unwrap()
    }

    #[tokio::test]
    async fn test_configured_namespace() {
        let client = kube_client();
        let config = Config { namespace: "awx-prod".to_string(), ..Config::default() };
        assert_eq!(ResourceResolver::from((&client, &config)).namespace(), "awx-prod");
    }

    #[tokio::test]
    async fn test_empty_namespace_falls_back_to_context() {
        let client = kube_client();
        let config = Config { namespace: String::new(), ..Config::default() };
        assert_eq!(
            ResourceResolver::from((&client, &config)).namespace(),
            client.default_namespace()
        );
    }

    #[tokio::test]
    async fn test_configured_instance_needs_no_lookup() {
        let client = kube_client();
        let config = Config { instance: Some("awx-demo".to_string()), ..Config::default() };
        let ResolvedResources { namespace, instance_name } =
            ResourceResolver::from((&client, &config)).resolve().await.unwrap();
        assert_eq!(namespace, "awx");
        assert_eq!(instance_name, "awx-demo");
    }
}
