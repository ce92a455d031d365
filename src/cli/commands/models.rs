//! Models Command
//!
//! List the configured model catalog.

use std::path::Path;

use crate::ai::model::LanguageModel;
use crate::ai::tokenizer::{UnitKind, cost_usd};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::types::Result;

pub fn run(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let models: Vec<&LanguageModel> = ctx.transformer.registry().models().collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&models)?),
        OutputFormat::Text => {
            let output = Output::new();
            output.section("Models");
            for model in models {
                let mut line = describe(model);
                if model.label == ctx.config.transform.instruction_model {
                    line.push_str("  [instruction]");
                }
                if model.label == ctx.config.transform.shortening_model {
                    line.push_str("  [shortening]");
                }
                println!("  {}", line);
            }
        }
    }
    Ok(())
}

/// Summary line with prices per 1K tokens
fn describe(model: &LanguageModel) -> String {
    format!(
        "{:<10} {:<18} {:<10} {:>6} tok ({} resp)  ${:.4}/1K in  ${:.4}/1K out  {}s",
        model.label,
        model.name,
        model.api.to_string(),
        model.max_total_tokens,
        model.max_response_tokens,
        cost_usd(1000, model, UnitKind::Request),
        cost_usd(1000, model, UnitKind::Response),
        model.timeout.as_secs_f64()
    )
}
