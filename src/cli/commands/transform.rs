//! Transform Command
//!
//! Run a text transformation and print the result.
//!
//! Usage:
//!   recast transform [TEXT] [--file F] -i "Fix the grammar:" [--model L] [--dry-run] [-f json]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, TransformOptions, cancel_on_ctrl_c, read_input};
use crate::transform::{Status, TextTransformationResult};
use crate::types::Result;

pub async fn run(
    config_path: Option<&Path>,
    options: &TransformOptions,
) -> Result<TextTransformationResult> {
    let input = read_input(options.text.as_deref(), options.file.as_deref())?;
    let ctx = CommandContext::load(config_path)?;
    let request = ctx.request(input, options)?;

    let cancel = cancel_on_ctrl_c();
    let result = ctx
        .transformer
        .execute_cancellable(&request, options.dry_run, &cancel)
        .await?;

    print_result(&result, options.format)?;
    Ok(result)
}

fn print_result(result: &TextTransformationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            let output = Output::new();
            match &result.status {
                Status::Success => println!("{}", result.result_text),
                Status::Error { title, details } => {
                    output.error(title);
                    eprintln!("{}", details);
                }
            }
            output.info(&cost_line(result));
        }
    }
    Ok(())
}

/// One-line cost summary: actual cost for real runs, estimate for dry runs
fn cost_line(result: &TextTransformationResult) -> String {
    if result.is_dry_run {
        format!("Dry run, estimated ~{}", result.estimated_cost.text)
    } else {
        format!(
            "Cost: {} (estimated ~{})",
            result.actual_cost.text, result.estimated_cost.text
        )
    }
}
