//! Playbook command handlers.

use agentic_context::config::AgenticContextConfig;
use agentic_context::models::ExtractionResult;
use agentic_context::rendering::PlaybookRenderer;
use agentic_context::services::PlaybookPipeline;
use agentic_context::storage::PlaybookStore;
use std::io::Read;
use std::path::Path;

/// Show command.
pub fn cmd_show(config: &AgenticContextConfig) -> Result<(), Box<dyn std::error::Error>> {
    let playbook = PlaybookStore::new(config.playbook_path()).load();
    let renderer = PlaybookRenderer::from_optional_file(config.template_path.as_deref());
    let rendered = renderer.render(&playbook);

    if rendered.is_empty() {
        println!("Playbook is empty ({})", config.playbook_path().display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}

/// Apply command.
pub fn cmd_apply(
    config: &AgenticContextConfig,
    input: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        },
    };
    let extraction = ExtractionResult::from_json(&raw)?;

    let report = PlaybookPipeline::from_config(config).run(&extraction)?;

    println!("Applied extraction to {}", config.playbook_path().display());
    print!("{}", report.update);
    print!("{}", report.dedup);
    println!("entries: {}", report.entries);
    Ok(())
}

/// Prune command.
pub fn cmd_prune(config: &AgenticContextConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pruned = PlaybookPipeline::from_config(config).prune()?;

    if pruned.is_empty() {
        println!("Nothing to prune");
    }
    for (section, entry) in &pruned {
        println!(
            "Pruned [{}] {} (helpful={} harmful={})",
            section.name(),
            entry.name,
            entry.helpful,
            entry.harmful
        );
    }
    Ok(())
}

/// Dedup command.
///
/// An explicit threshold takes precedence over the environment and config file.
pub fn cmd_dedup(
    mut config: AgenticContextConfig,
    threshold: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(threshold) = threshold {
        config.dedup = config.dedup.with_threshold(threshold);
    }
    let report = PlaybookPipeline::from_config(&config).dedup()?;
    print!("{report}");
    Ok(())
}

/// Migrate command.
pub fn cmd_migrate(config: &AgenticContextConfig) -> Result<(), Box<dyn std::error::Error>> {
    let report = PlaybookPipeline::from_config(config).migrate()?;
    println!("Migrated {}", config.playbook_path().display());
    print!("{report}");
    Ok(())
}
