//! Transformation Orchestrator
//!
//! Drives one transformation call:
//!
//! 1. Resolve both model labels (fails before any network call)
//! 2. Estimate pass: simulated rounds giving the worst-case cost preview
//! 3. Execution pass: real rounds, or the estimate pass again for dry runs
//!
//! A pass sends `text + postfix` to the instruction model once it fits.
//! Until then the text is chunked, every chunk is shortened by the shortening
//! model, and the shortened chunks are joined and tried again.
//!
//! Rounds are strictly sequential. Cancellation is checked before every round
//! and races the round in flight.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::chunking::TextChunker;
use super::types::{TextTransformationResult, TransformRequest};
use crate::ai::model::LanguageModel;
use crate::ai::provider::{ModelRegistry, Response, SharedBackend};
use crate::ai::tokenizer::TokenCounter;
use crate::constants::chunking::SHORTENED_PART_SEPARATOR;
use crate::types::{RecastError, Result};

/// Title of the error response ending a pass that made no progress
const NOT_SHRINKING_TITLE: &str = "Text is not getting shorter";

pub struct TextTransformer {
    registry: ModelRegistry,
    counter: TokenCounter,
    chunker: TextChunker,
}

/// Backends resolved for one call
struct Route<'a> {
    instruction: &'a SharedBackend,
    shortening: &'a SharedBackend,
}

impl TextTransformer {
    pub fn new(registry: ModelRegistry, counter: TokenCounter) -> Self {
        let chunker = TextChunker::new(counter.clone());
        Self {
            registry,
            counter,
            chunker,
        }
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Run a transformation to completion
    pub async fn execute(
        &self,
        request: &TransformRequest,
        is_dry_run: bool,
    ) -> Result<TextTransformationResult> {
        self.execute_cancellable(request, is_dry_run, &CancellationToken::new())
            .await
    }

    /// Run a transformation that `cancel` can abort between or during rounds.
    ///
    /// Only configuration errors and cancellation are returned as `Err`; round
    /// failures end up in the result's `status`.
    #[instrument(
        skip_all,
        fields(
            run_id = %Uuid::new_v4(),
            model = %request.instruction_model,
            dry_run = is_dry_run,
            input_chars = request.input_text.chars().count()
        )
    )]
    pub async fn execute_cancellable(
        &self,
        request: &TransformRequest,
        is_dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<TextTransformationResult> {
        let route = Route {
            instruction: self.registry.get(&request.instruction_model)?,
            shortening: self.registry.get(&request.shortening_model)?,
        };

        let simulated = self.run_rounds(&route, request, true, cancel).await?;
        let execution = if is_dry_run {
            // Simulation is deterministic, a second pass would be identical
            simulated.clone()
        } else {
            self.run_rounds(&route, request, false, cancel).await?
        };

        let result = TextTransformationResult::from_rounds(is_dry_run, &simulated, &execution);
        info!(
            rounds = execution.len(),
            estimated = %result.estimated_cost.text,
            success = result.status.is_success(),
            "Transformation finished"
        );
        Ok(result)
    }

    /// All rounds of one pass, in order. Stops at the first failed round.
    async fn run_rounds(
        &self,
        route: &Route<'_>,
        request: &TransformRequest,
        is_dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Response>> {
        let instruction_model = route.instruction.model();
        let shortening_model = route.shortening.model();
        let mut responses = Vec::new();
        let mut text = request.input_text.clone();

        for pass in 1.. {
            let candidate = format!("{}{}", text, request.postfix_instruction);
            if self.counter.fits(&candidate, instruction_model) {
                let response = self
                    .round(route.instruction, &candidate, request, is_dry_run, cancel)
                    .await?;
                responses.push(response);
                break;
            }

            let chunks =
                self.chunker
                    .split(&text, &request.shortening_instruction, shortening_model)?;
            debug!(
                pass,
                chunks = chunks.len(),
                chars = text.chars().count(),
                dry_run = is_dry_run,
                "Shortening oversized text"
            );

            let mut shortened = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                let input = format!("{}{}", chunk, request.shortening_instruction);
                let response = self
                    .round(route.shortening, &input, request, is_dry_run, cancel)
                    .await?;
                if response.is_error() {
                    warn!(pass, title = %response.error_title, "Shortening round failed, stopping");
                    responses.push(response);
                    return Ok(responses);
                }
                shortened.push(response.text.clone());
                responses.push(response);
            }

            let next = shortened.join(SHORTENED_PART_SEPARATOR);
            let (before, after) = (text.chars().count(), next.chars().count());
            if after >= before {
                warn!(pass, before, after, "Shortening made no progress, stopping");
                responses.push(not_shrinking(shortening_model, before, after));
                break;
            }
            text = next;
        }

        Ok(responses)
    }

    async fn round(
        &self,
        backend: &SharedBackend,
        input_text: &str,
        request: &TransformRequest,
        is_dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        if cancel.is_cancelled() {
            return Err(RecastError::Cancelled);
        }
        let model = backend.model();
        if is_dry_run {
            return Ok(Response::simulated(input_text, model, &self.counter));
        }

        let temperature = model.temperature(request.temperature_normalized);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(model = %model.label, "Round cancelled in flight");
                Err(RecastError::Cancelled)
            }
            response = backend.transform(input_text, temperature) => Ok(response),
        }
    }
}

/// Unbilled error response for a pass that did not reduce the text
fn not_shrinking(model: &LanguageModel, before: usize, after: usize) -> Response {
    Response {
        error_title: NOT_SHRINKING_TITLE.to_string(),
        error_text: format!(
            "Shortening with {} produced {} characters from {}",
            model.label, after, before
        ),
        ..Response::success(String::new(), model, 0, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::model::builtin_models;
    use crate::ai::provider::mock::{MockBackend, Reply};
    use crate::transform::Status;
    use crate::types::RoundError;
    use std::sync::Arc;
    use std::time::Duration;

    const INSTRUCTION: &str = "\n\nFix the grammar:";

    fn model(label: &str) -> LanguageModel {
        builtin_models()
            .into_iter()
            .find(|m| m.label == label)
            .unwrap()
    }

    struct Harness {
        transformer: TextTransformer,
        instruction: Arc<MockBackend>,
        shortening: Arc<MockBackend>,
    }

    fn harness(instruction: MockBackend, shortening: MockBackend) -> Harness {
        let instruction = Arc::new(instruction);
        let shortening = Arc::new(shortening);
        let registry = ModelRegistry::new(vec![
            Arc::clone(&instruction) as SharedBackend,
            Arc::clone(&shortening) as SharedBackend,
        ])
        .unwrap();
        Harness {
            transformer: TextTransformer::new(registry, TokenCounter::char_based()),
            instruction,
            shortening,
        }
    }

    fn default_harness() -> Harness {
        harness(
            MockBackend::new(model("DaVinci")).with_reply(Reply::Fixed("Hallo Welt".into())),
            MockBackend::new(model("Turbo")).with_reply(Reply::Truncate(300)),
        )
    }

    #[tokio::test]
    async fn test_fitting_text_is_one_round() {
        let h = default_harness();
        let request = TransformRequest::new("Hello world", INSTRUCTION);

        let result = h.transformer.execute(&request, false).await.unwrap();

        assert_eq!(result.result_text, "Hallo Welt");
        assert_eq!(result.status, Status::Success);
        assert_eq!(h.instruction.calls(), 1);
        assert_eq!(h.shortening.calls(), 0);
        assert_eq!(h.instruction.inputs(), [format!("Hello world{}", INSTRUCTION)]);
        assert_eq!(result.actual_cost.compute_rounds.len(), 1);
        assert_eq!(result.estimated_cost.compute_rounds.len(), 1);
        assert!(!result.is_dry_run);
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_backends() {
        let h = default_harness();
        let request = TransformRequest::new("x".repeat(50_000), INSTRUCTION);

        let result = h.transformer.execute(&request, true).await.unwrap();

        assert_eq!(h.instruction.calls(), 0);
        assert_eq!(h.shortening.calls(), 0);
        assert!(result.actual_cost.is_zero());
        assert!(result.estimated_cost.compute_rounds.len() > 1);
        assert!(result.is_dry_run);
        assert_eq!(result.result_text, "#".repeat(512));
    }

    #[tokio::test]
    async fn test_million_chars_terminates() {
        let h = default_harness();
        let request = TransformRequest::new("lorem ipsum ".repeat(83_334), INSTRUCTION);
        assert!(request.input_text.len() >= 1_000_000);

        let result = h.transformer.execute(&request, false).await.unwrap();

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.result_text, "Hallo Welt");
        assert_eq!(h.instruction.calls(), 1);
        let rounds = result.actual_cost.compute_rounds.len();
        assert!(rounds > 1 && rounds < 1_000, "rounds: {}", rounds);
        assert_eq!(rounds, h.shortening.calls() + 1);

        let estimated = result.estimated_cost.compute_rounds.len();
        assert!(estimated > 1 && estimated < 1_000, "estimated: {}", estimated);
    }

    #[tokio::test]
    async fn test_cost_additivity() {
        let h = default_harness();
        let request = TransformRequest::new("abc ".repeat(5_000), INSTRUCTION);

        let result = h.transformer.execute(&request, false).await.unwrap();

        for cost in [&result.estimated_cost, &result.actual_cost] {
            let sum: f64 = cost.compute_rounds.iter().map(|r| r.usd).sum();
            assert!((cost.usd - sum).abs() < 1e-9);
        }
        // Worst-case preview never undershoots the mocked run
        assert!(result.estimated_cost.usd >= result.actual_cost.usd);
    }

    #[tokio::test]
    async fn test_estimate_reports_worst_case_units() {
        let h = default_harness();
        let request = TransformRequest::new("Hello world", INSTRUCTION);

        let result = h.transformer.execute(&request, true).await.unwrap();
        let round = &result.estimated_cost.compute_rounds[0];

        assert_eq!(round.language_model, "DaVinci");
        assert_eq!(
            round.compute_units_in_request,
            "Hello world".len() + INSTRUCTION.len()
        );
        assert_eq!(round.compute_units_in_response, 512);
    }

    #[tokio::test]
    async fn test_unknown_model_fails_before_any_call() {
        let h = default_harness();
        let request = TransformRequest::new("Hello world", INSTRUCTION).with_instruction_model("NotAModel");

        let err = h.transformer.execute(&request, false).await.unwrap_err();

        assert!(matches!(err, RecastError::Config(_)));
        assert!(err.to_string().contains("NotAModel"));
        assert_eq!(h.instruction.calls(), 0);
        assert_eq!(h.shortening.calls(), 0);

        let request = TransformRequest::new("Hello world", INSTRUCTION).with_shortening_model("NotAModel");
        assert!(h.transformer.execute(&request, true).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_round_stops_chunk_loop() {
        let h = harness(
            MockBackend::new(model("DaVinci")),
            MockBackend::new(model("Turbo"))
                .with_reply(Reply::Truncate(300))
                .failing_on(1, RoundError::timeout(Duration::from_secs(60))),
        );
        let request = TransformRequest::new("y".repeat(20_000), INSTRUCTION);

        let result = h.transformer.execute(&request, false).await.unwrap();

        assert_eq!(h.shortening.calls(), 2);
        assert_eq!(h.instruction.calls(), 0);
        assert!(result.result_text.is_empty());
        match &result.status {
            Status::Error { title, .. } => assert_eq!(title, "Timed out"),
            Status::Success => panic!("expected error status"),
        }
        // The timed out round is billed at the worst case
        let failed = &result.actual_cost.compute_rounds[1];
        assert_eq!(failed.compute_units_in_request, 4096 - 512);
        assert_eq!(failed.compute_units_in_response, 512);
    }

    #[tokio::test]
    async fn test_offline_round_is_free() {
        let h = harness(
            MockBackend::new(model("DaVinci")).failing_on(0, RoundError::offline("dns error")),
            MockBackend::new(model("Turbo")),
        );
        let request = TransformRequest::new("Hello world", INSTRUCTION);

        let result = h.transformer.execute(&request, false).await.unwrap();

        assert!(!result.status.is_success());
        assert_eq!(result.actual_cost.usd, 0.0);
        assert_eq!(result.actual_cost.total_units(), 0);
    }

    #[tokio::test]
    async fn test_non_shrinking_pass_stops() {
        let h = harness(
            MockBackend::new(model("DaVinci")),
            MockBackend::new(model("Turbo")).with_reply(Reply::Echo),
        );
        let request = TransformRequest::new("z".repeat(10_000), INSTRUCTION);

        let result = h.transformer.execute(&request, false).await.unwrap();

        assert_eq!(h.instruction.calls(), 0);
        match &result.status {
            Status::Error { title, .. } => assert_eq!(title, NOT_SHRINKING_TITLE),
            Status::Success => panic!("expected error status"),
        }
        assert_eq!(result.actual_cost.compute_rounds.len(), h.shortening.calls() + 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = default_harness();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = h
            .transformer
            .execute_cancellable(&TransformRequest::new("Hello world", INSTRUCTION), false, &cancel)
            .await;

        assert!(matches!(result, Err(RecastError::Cancelled)));
        assert_eq!(h.instruction.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_in_flight() {
        let h = harness(
            MockBackend::new(model("DaVinci")).with_delay(Duration::from_secs(30)),
            MockBackend::new(model("Turbo")),
        );
        let cancel = CancellationToken::new();
        let request = TransformRequest::new("Hello world", INSTRUCTION);

        let (result, _) = tokio::join!(
            h.transformer.execute_cancellable(&request, false, &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
            }
        );

        assert!(matches!(result, Err(RecastError::Cancelled)));
        assert_eq!(h.instruction.calls(), 1);
    }
}
