use crate::llm_adapter::{CompletionRequest, LlmAdapter};
use crate::types::{RawDraft, RelayError, Result};
use std::sync::Arc;
use tracing::debug;

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 600;

/// Output dialect the channel can render: single-asterisk bold headline,
/// fact paragraphs, at most one `> ` quote block.
pub const STYLE_INSTRUCTION: &str = "Du bist ein erfahrener Redakteur für einen deutschen Telegram-Nachrichtenkanal. \
Erstelle Beiträge im gültigen Telegram-Markdown-Stil. \
Verwende ausschließlich folgende Formatierungen:\n\
- *fett* mit `*text*`\n\
- _kursiv_ mit `_text_`\n\
- Zitate mit `> text`\n\
- Keine Hashtags, keine `**` oder `__`, keine Links, keine Emojis.\n\n\
Struktur:\n\
1. *Fette Überschrift ganz oben*\n\
2. Kurzer Einstiegssatz\n\
3. Ein oder zwei Absätze mit Fakten\n\
4. Optional ein Zitatblock (`> Zitat`)\n\n\
Nutze `\\n\\n` für Absatztrennung. Der Text soll klar, sachlich und professionell wirken.";

pub struct ContentRewriter {
    adapter: Arc<dyn LlmAdapter>,
}

impl ContentRewriter {
    pub fn new(adapter: Arc<dyn LlmAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter_name(&self) -> String {
        self.adapter.adapter_name()
    }

    pub fn build_request(raw_text: &str) -> CompletionRequest {
        CompletionRequest {
            system: STYLE_INSTRUCTION.to_string(),
            user: format!(
                "Formuliere aus dieser Nachricht einen hochwertigen Beitrag:\n\n{}",
                raw_text
            ),
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    /// One completion call; any failure comes back as `RelayError::Rewrite`.
    pub async fn rewrite(&self, raw_text: &str) -> Result<RawDraft> {
        let request = Self::build_request(raw_text);
        let text = self.adapter.complete(&request).await.map_err(|e| match e {
            RelayError::Rewrite(_) => e,
            other => RelayError::Rewrite(other.to_string()),
        })?;
        debug!("Received draft of {} chars from {}", text.len(), self.adapter.adapter_name());
        Ok(RawDraft(text))
    }
}
