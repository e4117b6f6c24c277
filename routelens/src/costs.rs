//! Per-call cost model.
//!
//! Rates are keyed by substring match on the model identifier: any identifier
//! containing `gpt-4` is billed at the GPT-4 rate, any containing `gpt-3.5`
//! at the GPT-3.5 rate, and anything else costs exactly zero. The zero
//! fallback is deliberate - unrecognized models are treated as free rather
//! than rejected.
//!
//! "Tokens" throughout this crate are **character counts** of the prompt and
//! response text, not subword tokens. This is an approximation inherited from
//! the system that produced the stored historical data; changing it to real
//! tokenization would silently break comparability with existing rows.

/// USD per input token for GPT-4-class models.
const GPT4_INPUT_RATE: f64 = 5e-6;
/// USD per output token for GPT-4-class models.
const GPT4_OUTPUT_RATE: f64 = 1.5e-5;
/// USD per input token for GPT-3.5-class models.
const GPT35_INPUT_RATE: f64 = 2.5e-7;
/// USD per output token for GPT-3.5-class models.
const GPT35_OUTPUT_RATE: f64 = 1.25e-6;

/// Cost in USD of a call served by `model` with the given token counts.
pub fn cost(model: &str, input_tokens: i64, output_tokens: i64) -> f64 {
    let model = model.to_lowercase();
    if model.contains("gpt-4") {
        (input_tokens as f64 * GPT4_INPUT_RATE) + (output_tokens as f64 * GPT4_OUTPUT_RATE)
    } else if model.contains("gpt-3.5") {
        (input_tokens as f64 * GPT35_INPUT_RATE) + (output_tokens as f64 * GPT35_OUTPUT_RATE)
    } else {
        0.0
    }
}

/// Counterfactual cost: what the call would have cost at the GPT-4 rate,
/// regardless of which model actually served it.
pub fn gpt4_equivalent_cost(input_tokens: i64, output_tokens: i64) -> f64 {
    (input_tokens as f64 * GPT4_INPUT_RATE) + (output_tokens as f64 * GPT4_OUTPUT_RATE)
}

/// Token count of a piece of text, as this system defines tokens: the number
/// of characters. See the module docs for why this stays an approximation.
pub fn token_count(text: &str) -> i64 {
    text.chars().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt4_family_uses_gpt4_rate() {
        for model in ["gpt-4", "gpt-4o", "GPT-4-turbo", "openai/gpt-4o-mini"] {
            assert_eq!(cost(model, 100, 10), 100.0 * 5e-6 + 10.0 * 1.5e-5, "{model}");
        }
    }

    #[test]
    fn gpt35_family_uses_gpt35_rate() {
        for model in ["gpt-3.5-turbo", "GPT-3.5", "openai/gpt-3.5-turbo-0125"] {
            assert_eq!(cost(model, 100, 10), 100.0 * 2.5e-7 + 10.0 * 1.25e-6, "{model}");
        }
    }

    #[test]
    fn unrecognized_models_cost_zero() {
        for model in ["claude-3-opus", "llama-3-70b", "mistral-large", ""] {
            assert_eq!(cost(model, 1_000_000, 1_000_000), 0.0, "{model}");
        }
    }

    #[test]
    fn gpt4_equivalent_matches_gpt4_rate_for_any_identifier() {
        for (i, o) in [(0, 0), (30, 20), (512, 2048), (1, 1_000_000)] {
            assert_eq!(gpt4_equivalent_cost(i, o), cost("gpt-4-anything", i, o));
        }
    }

    #[test]
    fn capital_of_france_scenario() {
        // 30 input chars, 20 output chars on a gpt-3.5-class model.
        let c = cost("gpt-3.5-turbo", 30, 20);
        assert!((c - 3.25e-5).abs() < 1e-15, "got {c}");
    }

    #[test]
    fn tokens_are_character_counts() {
        assert_eq!(token_count("What is the capital of France?"), 30);
        assert_eq!(token_count(""), 0);
        // Multi-byte characters count once each.
        assert_eq!(token_count("héllo"), 5);
    }
}
