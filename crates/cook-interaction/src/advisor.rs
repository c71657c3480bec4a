//! The director's text-generation backend.

use async_trait::async_trait;

/// A remote model that answers director prompts.
///
/// `advise` never fails: every fault is logged and reported as empty text,
/// and empty text always means "decline to answer".
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Model identifier shown to the user, `None` when no backend is configured.
    fn model(&self) -> Option<&str>;

    fn is_available(&self) -> bool {
        self.model().is_some()
    }

    async fn advise(&self, prompt: &str, max_output: u32) -> String;
}

/// Stand-in used when no credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
    fn model(&self) -> Option<&str> {
        None
    }

    async fn advise(&self, _prompt: &str, _max_output: u32) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_advisor_always_declines() {
        let advisor = DisabledAdvisor;
        assert!(!advisor.is_available());
        let long = "x".repeat(10_000);
        for prompt in ["", "What next?", "[DONE]", long.as_str()] {
            assert_eq!(advisor.advise(prompt, 500).await, "");
        }
    }
}
