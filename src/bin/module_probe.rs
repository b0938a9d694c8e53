//! Module probe
//!
//! Loads a training module against the live site and prints the results as
//! JSON. Handy for checking the structural signatures after a site change.
//!
//! ```text
//! module-probe [MODULE_URL] [--section N | --all] [--config PATH]
//! ```

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use learn_module_reader::domain::ModuleReference;
use learn_module_reader::infrastructure::{ConfigManager, init_logging_with_config, learn_site};
use learn_module_reader::application::ErrorBody;
use learn_module_reader::{ModuleUseCases, ReaderError, SectionResponse};

#[derive(Debug)]
enum Target {
    Navigation,
    Section(usize),
    All,
}

#[derive(Debug)]
struct ProbeArgs {
    module_url: String,
    target: Target,
    config_path: Option<String>,
}

fn parse_args() -> Result<ProbeArgs> {
    let mut module_url = None;
    let mut target = Target::Navigation;
    let mut config_path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--section" => {
                let value = args.next().context("--section needs an ordinal")?;
                target = Target::Section(value.parse().with_context(|| format!("invalid ordinal '{value}'"))?);
            }
            "--all" => target = Target::All,
            "--config" => config_path = Some(args.next().context("--config needs a path")?),
            other if other.starts_with("--") => return Err(anyhow!("unknown option '{}'", other)),
            other => module_url = Some(other.to_string()),
        }
    }

    Ok(ProbeArgs {
        module_url: module_url.unwrap_or_else(|| learn_site::DEFAULT_MODULE_URL.to_string()),
        target,
        config_path,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let manager = match &args.config_path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_config().await?;
    init_logging_with_config(config.logging.clone())?;

    info!("🔍 Probing {} ({:?})", args.module_url, args.target);
    let use_cases = ModuleUseCases::from_config(&config)?;

    let output = match args.target {
        Target::Navigation => serde_json::to_string_pretty(&use_cases.load_navigation(&args.module_url).await)?,
        Target::Section(ordinal) => {
            serde_json::to_string_pretty(&use_cases.load_section(&args.module_url, ordinal).await)?
        }
        Target::All => {
            let reference = ModuleReference::parse_with_policy(&args.module_url, &config.module_urls)?;
            let assembler = use_cases.assembler();
            let mut module = assembler.open_module(&reference).await?;
            let ordinals: Vec<usize> = module.sections().iter().map(|s| s.ordinal).collect();
            let report = assembler.prefetch_sections(&mut module, &ordinals).await;

            for (ordinal, error) in &report.failed {
                warn!("Section {} failed: {}", ordinal, error);
            }
            info!("Loaded {}/{} sections", report.loaded.len(), ordinals.len());

            let sections: Vec<SectionResponse> = ordinals
                .iter()
                .map(|ordinal| match (module.take(*ordinal), report.failed.get(ordinal)) {
                    (Some(content), _) => SectionResponse::Ok(content),
                    (None, Some(error)) => SectionResponse::Error(ErrorBody::from(error)),
                    (None, None) => SectionResponse::Error(ErrorBody::from(&ReaderError::SectionNotFound {
                        ordinal: *ordinal,
                        available: ordinals.len(),
                    })),
                })
                .collect();

            serde_json::to_string_pretty(&serde_json::json!({
                "title": module.title,
                "request_id": module.request_id,
                "sections": sections,
            }))?
        }
    };

    println!("{output}");
    Ok(())
}
