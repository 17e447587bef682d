use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use knerrors::k8s::{diagnose, is_forbidden, Diagnosis, StatusError};
use serde_json::{json, Value};
use std::path::Path;

pub async fn execute(message: Option<String>, status_file: Option<&Path>, output: &str) -> Result<()> {
    let err = match (status_file, message) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read status file: {:?}", path))?;
            status_error_from_document(&content)?
        }
        (None, Some(message)) => anyhow!(message),
        (None, None) => anyhow::bail!("Provide an error MESSAGE or --status FILE"),
    };

    let forbidden = is_forbidden(&err);
    let diagnosis = diagnose(err);

    match output {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report(&diagnosis, forbidden))?);
        }
        _ => {
            let kind = match &diagnosis {
                Diagnosis::Known(_) => diagnosis.kind().green().bold(),
                Diagnosis::Unclassified(_) => diagnosis.kind().yellow().bold(),
            };
            println!("{} {}", kind, message_of(&diagnosis));
            if forbidden {
                println!("  {}", "access denied (403)".red());
            }
        }
    }

    Ok(())
}

/// Read a Status document (YAML or JSON) into an error carrying it.
fn status_error_from_document(content: &str) -> Result<anyhow::Error> {
    let status: Status =
        serde_yaml::from_str(content).context("Failed to parse status document")?;
    Ok(StatusError::new(status).into())
}

fn message_of(diagnosis: &Diagnosis) -> String {
    match diagnosis {
        Diagnosis::Known(kn) => kn.to_string(),
        Diagnosis::Unclassified(err) => format!("{:#}", err),
    }
}

fn report(diagnosis: &Diagnosis, forbidden: bool) -> Value {
    let (group, original) = match diagnosis {
        Diagnosis::Known(kn) => (kn.group(), kn.original_message()),
        Diagnosis::Unclassified(_) => (None, None),
    };
    json!({
        "kind": diagnosis.kind(),
        "message": message_of(diagnosis),
        "group": group,
        "original": original,
        "forbidden": forbidden,
    })
}
