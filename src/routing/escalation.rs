//! Escalation-signal detection on agent responses.

use crate::agent::{DetectIntentResponse, OutputContext};

/// True when any context's short name equals `sentinel`.
pub fn requests_operator(contexts: &[OutputContext], sentinel: &str) -> bool {
    contexts.iter().any(|ctx| ctx.short_name() == sentinel)
}

/// Convenience over a whole agent response.
pub fn response_requests_operator(response: &DetectIntentResponse, sentinel: &str) -> bool {
    requests_operator(&response.output_contexts, sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: &str = "operator_request";

    fn contexts(names: &[&str]) -> Vec<OutputContext> {
        names.iter().map(|n| OutputContext::new(*n)).collect()
    }

    #[test]
    fn detects_sentinel_in_final_segment() {
        assert!(requests_operator(
            &contexts(&["proj/sess/operator_request"]),
            SENTINEL
        ));
    }

    #[test]
    fn other_context_is_not_escalation() {
        assert!(!requests_operator(&contexts(&["proj/sess/other"]), SENTINEL));
    }

    #[test]
    fn empty_contexts_are_not_escalation() {
        assert!(!requests_operator(&[], SENTINEL));
    }

    #[test]
    fn sentinel_in_middle_segment_does_not_count() {
        assert!(!requests_operator(
            &contexts(&["proj/operator_request/other"]),
            SENTINEL
        ));
    }

    #[test]
    fn any_matching_context_wins() {
        let response = DetectIntentResponse {
            fulfillment_text: "hold on".into(),
            output_contexts: contexts(&["a/b/greeting", "a/b/operator_request", "a/b/other"]),
        };
        assert!(response_requests_operator(&response, SENTINEL));
    }
}
