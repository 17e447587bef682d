use anyhow::Result;
use colored::Colorize;
use knerrors::config::Config;

pub async fn execute(context: Option<String>, namespace: String) -> Result<()> {
    let config = Config {
        context,
        namespace,
        ..Config::default()
    };

    config.save()?;

    let config_path = Config::config_path()?;
    println!(
        "{} Configuration saved to {}",
        "OK".green().bold(),
        config_path.display()
    );
    println!(
        "  Context: {}",
        config.context.as_deref().unwrap_or("(current)").cyan()
    );
    println!("  Namespace: {}", config.namespace.cyan());
    for resource in &config.resources {
        println!("  Resource: {}", resource);
    }

    Ok(())
}
