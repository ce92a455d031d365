//! Chunking Engine
//!
//! Splits oversized text into overlapping chunks that each fit, together with
//! the shortening instruction, in the shortening model's token budget.
//!
//! ## Size search
//!
//! The largest fitting chunk is found coarse-to-fine: start with an increment
//! equal to the model's request budget (1 token is at least 1 character for most
//! text), grow the chunk while it fits, halve the increment, repeat until the
//! increment drops to the accuracy threshold. This takes a logarithmic number of
//! fit checks instead of a linear scan.
//!
//! All positions are in characters, never bytes.

use crate::ai::model::LanguageModel;
use crate::ai::tokenizer::TokenCounter;
use crate::constants::chunking as chunk_constants;
use crate::types::{RecastError, Result};

#[derive(Debug, Clone)]
pub struct TextChunker {
    counter: TokenCounter,
    overlap_chars: usize,
    accuracy_threshold: usize,
}

impl TextChunker {
    pub fn new(counter: TokenCounter) -> Self {
        Self {
            counter,
            overlap_chars: chunk_constants::DEFAULT_OVERLAP_CHARS,
            accuracy_threshold: chunk_constants::DEFAULT_ACCURACY_THRESHOLD,
        }
    }

    pub fn with_overlap(mut self, overlap_chars: usize) -> Self {
        self.overlap_chars = overlap_chars;
        self
    }

    pub fn with_accuracy_threshold(mut self, accuracy_threshold: usize) -> Self {
        self.accuracy_threshold = accuracy_threshold;
        self
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Split `text` into chunks where every `chunk + suffix` fits `model`.
    ///
    /// Consecutive chunks share exactly `overlap_chars` characters. A chunk no
    /// longer than the overlap shares `size / 2` instead so the split advances.
    pub fn split(&self, text: &str, suffix: &str, model: &LanguageModel) -> Result<Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let remaining = &chars[start..];
            let size = self.max_chunk_size(remaining, suffix, model)?;
            chunks.push(remaining[..size].iter().collect::<String>());

            if size == remaining.len() {
                break;
            }
            start += size - self.backtrack(size);
        }

        Ok(chunks)
    }

    fn backtrack(&self, size: usize) -> usize {
        if size > self.overlap_chars {
            self.overlap_chars
        } else {
            size / 2
        }
    }

    fn max_chunk_size(&self, remaining: &[char], suffix: &str, model: &LanguageModel) -> Result<usize> {
        let initial_increment = model.max_request_tokens();
        // At least one search level must run, and the increment never reaches 0
        let threshold = self
            .accuracy_threshold
            .min(initial_increment.saturating_sub(1));

        let mut increment = initial_increment;
        let mut size = 0;
        while increment > threshold {
            while size < remaining.len() {
                let candidate_size = (size + increment).min(remaining.len());
                if !self.fits(&remaining[..candidate_size], suffix, model) {
                    break;
                }
                size = candidate_size;
            }
            increment /= 2;
        }

        if size == 0 {
            return Err(RecastError::config(format!(
                "Shortening instruction leaves no room for text in model {} ({} tokens)",
                model.label, model.max_total_tokens
            )));
        }
        Ok(size)
    }

    fn fits(&self, chunk: &[char], suffix: &str, model: &LanguageModel) -> bool {
        let mut candidate: String = chunk.iter().collect();
        candidate.push_str(suffix);
        self.counter.fits(&candidate, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::model::builtin_models;
    use crate::constants::transform::DEFAULT_SHORTENING_INSTRUCTION;
    use proptest::prelude::*;

    fn tiny_model(max_total_tokens: usize, max_response_tokens: usize) -> LanguageModel {
        LanguageModel {
            label: "Tiny".to_string(),
            max_total_tokens,
            max_response_tokens,
            ..builtin_models()[1].clone()
        }
    }

    fn chunker() -> TextChunker {
        TextChunker::new(TokenCounter::char_based())
    }

    fn assert_overlap(chunks: &[String], overlap: usize) {
        for pair in chunks.windows(2) {
            let head: Vec<char> = pair[0].chars().collect();
            let tail: String = head[head.len() - overlap..].iter().collect();
            let next_start: String = pair[1].chars().take(overlap).collect();
            assert_eq!(tail, next_start);
        }
    }

    #[test]
    fn test_ten_thousand_chars_tiny_budget() {
        let model = tiny_model(100, 20);
        let text = "abcdefghij".repeat(1_000);
        let chunks = chunker()
            .split(&text, DEFAULT_SHORTENING_INSTRUCTION, &model)
            .unwrap();

        assert!(chunks.len() >= 2);
        let counter = TokenCounter::char_based();
        for chunk in &chunks {
            let candidate = format!("{}{}", chunk, DEFAULT_SHORTENING_INSTRUCTION);
            assert!(counter.estimate_total_units(&candidate, &model) <= model.max_total_tokens);
        }
        // The last chunk reaches the end of the text
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn test_default_budget_overlaps_exactly() {
        let model = builtin_models()[1].clone();
        let text: String = (0..20_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker()
            .split(&text, DEFAULT_SHORTENING_INSTRUCTION, &model)
            .unwrap();

        assert!(chunks.len() >= 6);
        assert_overlap(&chunks, 100);
        // Search lands within the accuracy threshold of the budget
        let budget = model.max_request_tokens() - DEFAULT_SHORTENING_INSTRUCTION.chars().count();
        assert!(chunks[0].chars().count() > budget - 10);
        assert!(chunks[0].chars().count() <= budget);
    }

    #[test]
    fn test_chunk_below_twice_the_overlap_keeps_full_overlap() {
        let model = tiny_model(250, 100);
        let text: String = (0..1_000u32).filter_map(|i| char::from_u32(0x4E00 + i)).collect();
        let chunks = chunker().split(&text, "", &model).unwrap();

        assert_eq!(chunks[0].chars().count(), 150);
        assert_overlap(&chunks, 100);
        let second_start: Vec<char> = text.chars().skip(50).take(10).collect();
        assert!(chunks[1].starts_with(&second_start.iter().collect::<String>()));
    }

    #[test]
    fn test_chunk_within_overlap_still_advances() {
        let model = tiny_model(30, 10);
        let chunks = chunker()
            .with_overlap(100)
            .split(&"abcdefghij".repeat(10), "", &model)
            .unwrap();

        assert_eq!(chunks[0].chars().count(), 20);
        assert_overlap(&chunks, 10);
        assert!(chunks.len() < 20);
    }

    #[test]
    fn test_text_shorter_than_a_chunk_is_single_chunk() {
        let model = builtin_models()[1].clone();
        let chunks = chunker().split("Hello world", "", &model).unwrap();
        assert_eq!(chunks, ["Hello world"]);
    }

    #[test]
    fn test_multibyte_text_is_split_on_characters() {
        let model = tiny_model(100, 20);
        let text = "żółw 🐢 ".repeat(300);
        let chunks = chunker().split(&text, "", &model).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 80);
        }
    }

    #[test]
    fn test_instruction_overflowing_budget_is_config_error() {
        let model = tiny_model(100, 20);
        let suffix = "x".repeat(90);
        let result = chunker().split("some text", &suffix, &model);
        assert!(matches!(result, Err(RecastError::Config(_))));
    }

    #[test]
    fn test_threshold_above_budget_still_searches() {
        let model = tiny_model(30, 10);
        let chunks = chunker()
            .with_accuracy_threshold(50)
            .split(&"a".repeat(100), "", &model)
            .unwrap();
        assert_eq!(chunks[0].len(), 20);
        assert!(chunks.iter().all(|c| c.len() <= 20));
    }

    proptest! {
        #[test]
        fn prop_chunks_fit_budget_and_overlap(
            text in "\\PC{1,3000}",
            max_total in 60usize..600,
            response_share in 1usize..50,
            overlap in 0usize..150,
        ) {
            let max_response = (max_total * response_share / 100).max(1);
            let model = tiny_model(max_total, max_response);
            let suffix = "\n\nShorter:";
            let chunker = chunker().with_overlap(overlap);
            let chunks = chunker.split(&text, suffix, &model).unwrap();
            let counter = TokenCounter::char_based();

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                let candidate = format!("{}{}", chunk, suffix);
                prop_assert!(counter.estimate_total_units(&candidate, &model) <= max_total);
            }
            for pair in chunks.windows(2) {
                let head: Vec<char> = pair[0].chars().collect();
                let shared = if head.len() > overlap { overlap } else { head.len() / 2 };
                let tail: String = head[head.len() - shared..].iter().collect();
                prop_assert!(pair[1].starts_with(&tail));
            }
            prop_assert!(text.ends_with(chunks.last().unwrap().as_str()));
        }
    }
}
