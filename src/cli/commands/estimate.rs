//! Estimate Command
//!
//! Worst-case cost preview of a transformation. Never touches the network.
//!
//! Usage:
//!   recast estimate [TEXT] [--file F] -i "Fix the grammar:" [--model L] [-f json]

use std::path::Path;

use crate::ai::cost::{ComputeCost, format_significant};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, TransformOptions, read_input};
use crate::types::Result;

/// Rounds of one model within an estimate
#[derive(Debug, Clone, PartialEq)]
pub struct ModelShare {
    pub label: String,
    pub rounds: usize,
    pub units: usize,
    pub usd: f64,
}

pub async fn run(config_path: Option<&Path>, options: &TransformOptions) -> Result<ComputeCost> {
    let input = read_input(options.text.as_deref(), options.file.as_deref())?;
    let ctx = CommandContext::load(config_path)?;
    let request = ctx.request(input, options)?;

    let result = ctx.transformer.execute(&request, true).await?;
    let cost = result.estimated_cost;

    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cost)?),
        OutputFormat::Text => print_estimate(&cost),
    }
    Ok(cost)
}

fn print_estimate(cost: &ComputeCost) {
    let output = Output::new();
    output.section("Estimate (worst case)");
    output.field("Rounds", &cost.compute_rounds.len().to_string());
    output.field("Tokens", &cost.total_units().to_string());
    output.field("Cost", &format!("${}", format_significant(cost.usd, 2)));
    for share in shares_by_model(cost) {
        output.field(
            &share.label,
            &format!(
                "{} rounds, {} tokens, ${}",
                share.rounds,
                share.units,
                format_significant(share.usd, 2)
            ),
        );
    }
}

/// Per-model totals in order of first use
pub fn shares_by_model(cost: &ComputeCost) -> Vec<ModelShare> {
    let mut shares: Vec<ModelShare> = Vec::new();
    for round in &cost.compute_rounds {
        let units = round.compute_units_in_request + round.compute_units_in_response;
        match shares.iter_mut().find(|s| s.label == round.language_model) {
            Some(share) => {
                share.rounds += 1;
                share.units += units;
                share.usd += round.usd;
            }
            None => shares.push(ModelShare {
                label: round.language_model.clone(),
                rounds: 1,
                units,
                usd: round.usd,
            }),
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::cost::ComputeRound;

    #[test]
    fn test_shares_grouped_in_first_use_order() {
        let round = |label: &str, usd: f64| ComputeRound {
            language_model: label.to_string(),
            compute_units_in_request: 100,
            compute_units_in_response: 50,
            usd,
        };
        let cost = ComputeCost::from_rounds(vec![
            round("Turbo", 0.1),
            round("Turbo", 0.2),
            round("DaVinci", 0.5),
        ]);

        let shares = shares_by_model(&cost);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].label, "Turbo");
        assert_eq!(shares[0].rounds, 2);
        assert_eq!(shares[0].units, 300);
        assert!((shares[0].usd - 0.3).abs() < 1e-9);
        assert_eq!(shares[1].label, "DaVinci");
    }
}
