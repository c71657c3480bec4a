//! Director prompts and the sentinel protocol.
//!
//! The director is asked one of two questions: what to tell the agent next
//! (continuation) or whether to interject into a session it is watching
//! (chime-in). Each answer is free text in which a fixed marker encodes the
//! decision to stay out.

use cook_core::text::truncate_chars;
use cook_core::{Conversation, Message, RunConfig};
use minijinja::{Environment, context};
use serde::Serialize;
use std::sync::Arc;

use crate::advisor::Advisor;

const CONTEXT_WINDOW: usize = 6;

const CONTINUATION_LATEST_CHARS: usize = 2000;
const CONTINUATION_TURN_CHARS: usize = 500;
const CHIME_IN_LATEST_CHARS: usize = 1500;
const CHIME_IN_TURN_CHARS: usize = 400;

const CONTINUATION_TEMPLATE: &str = r#"You are the cook in "Let Them Cook" - driving Claude Code through tasks.

ORIGINAL TASK: {{ task }}
{% if aggressive %}

IMPORTANT: This is an OPEN-ENDED, ITERATIVE task. Push for CONTINUOUS improvement.
Do NOT say [DONE] unless Claude explicitly cannot continue or needs specific user input.
Always push for the NEXT improvement, NEXT implementation, NEXT iteration.
Ask Claude to IMPLEMENT changes, not just explain them.
{% endif %}

Claude's latest response:
---
{{ latest }}
---

Recent conversation:
{% for turn in recent %}{{ turn.role }}: {{ turn.text }}
{% endfor %}

What should you tell Claude next?

Rules:
1. If Claude says it CANNOT continue or needs specific user input: Output [DONE]
2. Otherwise: Output your next instruction to push the task forward
3. Be specific and actionable
4. Ask for implementations, not explanations
5. Push for the next step/improvement

Your response (next instruction, or [DONE]):"#;

const CHIME_IN_TEMPLATE: &str = r#"You are a pair programmer watching Claude Code work.
{% if task %}ORIGINAL TASK: {{ task }}
{% endif %}{% if aggressive %}

IMPORTANT: Be proactive. If there's ANY opportunity to push forward, take it.
Look for:
- Things Claude could improve
- Next logical steps
- Errors or issues to address
- Ways to make the solution more complete
{% endif %}

Claude just said:
---
{{ latest }}
---

Tool calls made: {{ tools }}

Recent conversation:
{% for turn in recent %}{{ turn.role }}: {{ turn.text }}
{% endfor %}

Should you chime in? Consider:
1. Is Claude stuck or going in the wrong direction?
2. Is there an obvious next step Claude should take?
3. Did Claude make an error that needs correction?
4. Is the task incomplete and needs more work?

If YES - provide your message to Claude (be specific and actionable)
If NO - respond with exactly: [SILENT]

Your response:"#;

/// Marker the director uses to decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Continuation: the task is finished or needs the human.
    Done,
    /// Chime-in: nothing worth saying.
    Silent,
}

impl Sentinel {
    pub fn marker(&self) -> &'static str {
        match self {
            Sentinel::Done => "[DONE]",
            Sentinel::Silent => "[SILENT]",
        }
    }
}

/// Turns a raw director response into an instruction.
///
/// Empty text and any response containing the marker anywhere mean "no
/// instruction". Prose that merely mentions the marker is therefore also
/// treated as a decline.
pub fn interpret(response: &str, sentinel: Sentinel) -> Option<String> {
    let trimmed = response.trim();
    if trimmed.is_empty() || response.contains(sentinel.marker()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ContextTurn {
    role: String,
    text: String,
}

fn context_turns(conversation: &Conversation, max_chars: usize) -> Vec<ContextTurn> {
    conversation
        .recent(CONTEXT_WINDOW)
        .iter()
        .map(|m| ContextTurn {
            role: m.role.to_string(),
            text: truncate_chars(&m.text, max_chars).to_string(),
        })
        .collect()
}

/// Asks the advisor for the next instruction.
pub struct Director {
    advisor: Arc<dyn Advisor>,
    env: Environment<'static>,
    aggressive: bool,
    passive: bool,
    continuation_max_tokens: u32,
    chime_in_max_tokens: u32,
}

impl Director {
    pub fn new(advisor: Arc<dyn Advisor>, config: &RunConfig) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        // Both templates are compile-time constants.
        for (name, source) in [
            ("continuation", CONTINUATION_TEMPLATE),
            ("chime_in", CHIME_IN_TEMPLATE),
        ] {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!(template = name, error = %e, "Invalid director template");
            }
        }

        Self {
            advisor,
            env,
            aggressive: config.aggressive,
            passive: config.is_passive(),
            continuation_max_tokens: config.advisor.continuation_max_tokens,
            chime_in_max_tokens: config.advisor.chime_in_max_tokens,
        }
    }

    pub fn advisor(&self) -> &dyn Advisor {
        self.advisor.as_ref()
    }

    /// Task used to frame the continuation prompt.
    fn original_task<'a>(task: Option<&'a str>, conversation: &'a Conversation) -> &'a str {
        task.or_else(|| conversation.first().map(|m| m.text.as_str()))
            .unwrap_or("unknown")
    }

    pub fn continuation_prompt(
        &self,
        task: Option<&str>,
        latest: &str,
        conversation: &Conversation,
    ) -> Option<String> {
        self.render(
            "continuation",
            context! {
                task => Self::original_task(task, conversation),
                aggressive => self.aggressive,
                latest => truncate_chars(latest, CONTINUATION_LATEST_CHARS),
                recent => context_turns(conversation, CONTINUATION_TURN_CHARS),
            },
        )
    }

    pub fn chime_in_prompt(
        &self,
        task: Option<&str>,
        latest: &Message,
        conversation: &Conversation,
    ) -> Option<String> {
        let tools = match &latest.tool_invocations {
            Some(tools) if !tools.is_empty() => {
                serde_json::to_string(tools).unwrap_or_else(|_| "None".to_string())
            }
            _ => "None".to_string(),
        };

        self.render(
            "chime_in",
            context! {
                task => task,
                aggressive => self.aggressive,
                latest => truncate_chars(&latest.text, CHIME_IN_LATEST_CHARS),
                tools => tools,
                recent => context_turns(conversation, CHIME_IN_TURN_CHARS),
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Option<String> {
        let rendered = self
            .env
            .get_template(name)
            .and_then(|template| template.render(ctx));
        match rendered {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                tracing::error!(template = name, error = %e, "Failed to render director prompt");
                None
            }
        }
    }

    /// Decides what to tell the agent after `latest`. `None` hands control back.
    pub async fn next_instruction(
        &self,
        task: Option<&str>,
        latest: &str,
        conversation: &Conversation,
    ) -> Option<String> {
        if !self.advisor.is_available() {
            return None;
        }
        let prompt = self.continuation_prompt(task, latest, conversation)?;
        let response = self
            .advisor
            .advise(&prompt, self.continuation_max_tokens)
            .await;
        interpret(&response, Sentinel::Done)
    }

    /// Decides whether to interject after a watched message.
    pub async fn chime_in(
        &self,
        task: Option<&str>,
        latest: &Message,
        conversation: &Conversation,
    ) -> Option<String> {
        if self.passive || !self.advisor.is_available() {
            return None;
        }
        let prompt = self.chime_in_prompt(task, latest, conversation)?;
        let response = self.advisor.advise(&prompt, self.chime_in_max_tokens).await;
        interpret(&response, Sentinel::Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cook_core::transcript::parse_line;
    use cook_core::{RunMode, ToolInvocation};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replies with a fixed answer and records every prompt.
    struct ScriptedAdvisor {
        reply: String,
        prompts: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedAdvisor {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, u32)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Advisor for ScriptedAdvisor {
        fn model(&self) -> Option<&str> {
            Some("scripted")
        }

        async fn advise(&self, prompt: &str, max_output: u32) -> String {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), max_output));
            self.reply.clone()
        }
    }

    fn config(mode: RunMode) -> RunConfig {
        RunConfig::new(
            mode,
            PathBuf::from("claude"),
            PathBuf::from("/work"),
            PathBuf::from("/projects"),
        )
    }

    #[test]
    fn test_interpret_sentinels() {
        assert_eq!(interpret("[DONE]", Sentinel::Done), None);
        assert_eq!(
            interpret("All good, I think we are [DONE] here.", Sentinel::Done),
            None
        );
        assert_eq!(interpret("", Sentinel::Done), None);
        assert_eq!(interpret("  \n", Sentinel::Silent), None);
        assert_eq!(interpret("prefix [SILENT]", Sentinel::Silent), None);
        assert_eq!(
            interpret("Now add error handling.", Sentinel::Done),
            Some("Now add error handling.".to_string())
        );
        // Each question only honours its own marker.
        assert_eq!(
            interpret("[SILENT]", Sentinel::Done),
            Some("[SILENT]".to_string())
        );
    }

    #[test]
    fn test_continuation_prompt_contents() {
        let director = Director::new(ScriptedAdvisor::new(""), &config(RunMode::Drive));
        let mut conversation = Conversation::new();
        conversation.push(Message::user("build X"));
        conversation.push(Message::assistant("y".repeat(900)));

        let latest = "z".repeat(2500);
        let prompt = director
            .continuation_prompt(None, &latest, &conversation)
            .unwrap();

        assert!(prompt.contains("ORIGINAL TASK: build X"));
        assert!(prompt.contains("Push for CONTINUOUS improvement"));
        assert!(prompt.contains(&"z".repeat(2000)));
        assert!(!prompt.contains(&"z".repeat(2001)));
        assert!(prompt.contains("USER: build X"));
        assert!(prompt.contains(&format!("ASSISTANT: {}\n", "y".repeat(500))));
        assert!(prompt.ends_with("Your response (next instruction, or [DONE]):"));
    }

    #[test]
    fn test_continuation_prompt_without_history_or_aggression() {
        let director = Director::new(
            ScriptedAdvisor::new(""),
            &config(RunMode::Drive).with_aggressive(false),
        );
        let prompt = director
            .continuation_prompt(None, "hello", &Conversation::new())
            .unwrap();
        assert!(prompt.contains("ORIGINAL TASK: unknown"));
        assert!(!prompt.contains("IMPORTANT"));
    }

    #[test]
    fn test_chime_in_prompt_contents() {
        let director = Director::new(ScriptedAdvisor::new(""), &config(RunMode::Watch));
        let message = parse_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Running tests"},{"type":"tool_use","name":"Bash","input":{"command":"cargo test"}}]}}"#,
        )
        .unwrap();
        let mut conversation = Conversation::new();
        conversation.push(message.clone());

        let prompt = director
            .chime_in_prompt(Some("ship it"), &message, &conversation)
            .unwrap();
        assert!(prompt.contains("ORIGINAL TASK: ship it"));
        assert!(prompt.contains("Be proactive"));
        assert!(prompt.contains(r#"Tool calls made: [{"name":"Bash","input":{"command":"cargo test"}}]"#));
        assert!(prompt.contains("ASSISTANT: Running tests"));

        let quiet = Message::assistant("hi");
        let prompt = director
            .chime_in_prompt(None, &quiet, &conversation)
            .unwrap();
        assert!(!prompt.contains("ORIGINAL TASK"));
        assert!(prompt.contains("Tool calls made: None"));
    }

    #[test]
    fn test_chime_in_context_shows_tool_output() {
        let director = Director::new(ScriptedAdvisor::new(""), &config(RunMode::Watch));
        let records = [
            r#"{"type":"user","message":{"content":"build X"}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"cargo build"}}]}}"#,
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"error[E0308]: mismatched types"}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Edit","input":{"file_path":"src/lib.rs"}}]}}"#,
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t2","content":"ok"}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"cargo test"}}]}}"#,
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t3","content":[{"type":"text","text":"test result: FAILED. 1 failed"}]}]}}"#,
        ];
        let mut conversation = Conversation::new();
        for record in records {
            conversation.push(parse_line(record).unwrap());
        }
        let latest = conversation.messages()[5].clone();

        let prompt = director
            .chime_in_prompt(Some("build X"), &latest, &conversation)
            .unwrap();
        assert!(prompt.contains("USER: error[E0308]: mismatched types"));
        assert!(prompt.contains("USER: test result: FAILED. 1 failed"));
    }

    #[test]
    fn test_prompt_sections_are_separated_by_blank_lines() {
        let director = Director::new(ScriptedAdvisor::new(""), &config(RunMode::Drive));
        let mut conversation = Conversation::new();
        conversation.push(Message::user("build X"));
        let prompt = director
            .continuation_prompt(Some("build X"), "Done.", &conversation)
            .unwrap();
        assert!(prompt.contains("ORIGINAL TASK: build X\n\nIMPORTANT:"));
        assert!(prompt.contains("not just explain them.\n\nClaude's latest response:"));
        assert!(prompt.contains("USER: build X\n\nWhat should you tell Claude next?"));

        let plain = Director::new(
            ScriptedAdvisor::new(""),
            &config(RunMode::Drive).with_aggressive(false),
        );
        let prompt = plain
            .continuation_prompt(Some("build X"), "Done.", &conversation)
            .unwrap();
        assert!(prompt.contains("ORIGINAL TASK: build X\n\nClaude's latest response:"));

        let watcher = Director::new(ScriptedAdvisor::new(""), &config(RunMode::Watch));
        let prompt = watcher
            .chime_in_prompt(Some("build X"), &Message::assistant("hi"), &conversation)
            .unwrap();
        assert!(prompt.contains("Claude Code work.\nORIGINAL TASK: build X\n\nIMPORTANT:"));
        assert!(prompt.contains("more complete\n\nClaude just said:"));
        assert!(prompt.contains("USER: build X\n\nShould you chime in?"));
    }

    #[tokio::test]
    async fn test_next_instruction_uses_continuation_budget() {
        let advisor = ScriptedAdvisor::new("  Add integration tests.\n");
        let director = Director::new(advisor.clone(), &config(RunMode::Drive));

        let next = director
            .next_instruction(Some("build X"), "Done.", &Conversation::new())
            .await;
        assert_eq!(next.as_deref(), Some("Add integration tests."));

        let calls = advisor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 500);
    }

    #[tokio::test]
    async fn test_chime_in_silent_and_budget() {
        let advisor = ScriptedAdvisor::new("[SILENT]");
        let director = Director::new(advisor.clone(), &config(RunMode::Watch));
        let message = Message::assistant("Looks fine");

        assert!(
            director
                .chime_in(None, &message, &Conversation::new())
                .await
                .is_none()
        );
        assert_eq!(advisor.calls()[0].1, 400);
    }

    #[tokio::test]
    async fn test_passive_never_consults_advisor() {
        let advisor = ScriptedAdvisor::new("Please fix the failing test.");
        let director = Director::new(advisor.clone(), &config(RunMode::Passive));

        let mut message = Message::assistant("error: test failed");
        message.tool_invocations = Some(vec![ToolInvocation {
            name: "Bash".into(),
            arguments: serde_json::json!({}),
        }]);
        assert!(
            director
                .chime_in(None, &message, &Conversation::new())
                .await
                .is_none()
        );
        assert!(advisor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_advisor_short_circuits() {
        let director = Director::new(
            Arc::new(crate::advisor::DisabledAdvisor),
            &config(RunMode::Drive),
        );
        assert!(
            director
                .next_instruction(Some("t"), "r", &Conversation::new())
                .await
                .is_none()
        );
    }
}
