use anyhow::Result;
use colored::Colorize;
use knerrors::config::{Config, ResourceTarget};
use knerrors::k8s::{is_forbidden, KnError, KubeClient};
use tracing::info;

pub async fn execute(
    config: &Config,
    context: Option<String>,
    namespace: Option<String>,
    resources: Vec<ResourceTarget>,
) -> Result<()> {
    let context = context.or_else(|| config.context.clone());
    let namespace = namespace.unwrap_or_else(|| config.namespace.clone());
    let resources = if resources.is_empty() {
        config.resources.clone()
    } else {
        resources
    };

    println!(
        "{} Checking {} resource(s) in namespace '{}'",
        "->".blue().bold(),
        resources.len(),
        namespace.cyan()
    );

    let client = KubeClient::new(context.as_deref()).await?;

    if !client.namespace_exists(&namespace).await? {
        anyhow::bail!("Namespace '{}' does not exist", namespace);
    }

    let mut failed = 0;
    for resource in &resources {
        print!("  {} {}... ", "->".blue(), resource);

        match client.probe(resource, Some(&namespace)).await {
            Ok(found) => {
                info!(resource = %resource, found, "probe succeeded");
                println!("{}", "ok".green());
            }
            Err(err) => {
                failed += 1;
                println!("{}", "failed".red());
                println!("     {}", describe(&err));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} resource check(s) failed", failed, resources.len());
    }

    println!(
        "\n{} All {} resource(s) reachable in namespace '{}'",
        "OK".green().bold(),
        resources.len(),
        namespace.cyan()
    );

    Ok(())
}

/// Render a probe failure the way a user can act on it.
fn describe(err: &anyhow::Error) -> String {
    if let Some(kn) = err.downcast_ref::<KnError>() {
        return kn.to_string();
    }
    if is_forbidden(err) {
        return format!("access denied: {}", err.root_cause());
    }
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
    use knerrors::k8s::StatusError;

    #[test]
    fn describes_known_errors_without_context() {
        let err = anyhow::Error::new(KnError::no_kube_config("no configuration has been provided"))
            .context("Failed to infer Kubernetes config");
        assert_eq!(
            describe(&err),
            "no kubeconfig has been provided, please use a valid configuration to connect to the cluster"
        );
    }

    #[test]
    fn describes_forbidden() {
        let err = anyhow::Error::new(StatusError::new(Status {
            code: Some(403),
            message: Some("services is forbidden".to_string()),
            ..Default::default()
        }))
        .context("Failed to list services");
        assert_eq!(describe(&err), "access denied: services is forbidden");
    }

    #[test]
    fn describes_other_errors_with_context() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("Failed to list brokers")
            .unwrap_err();
        assert_eq!(describe(&err), "Failed to list brokers: connection refused");
    }
}
