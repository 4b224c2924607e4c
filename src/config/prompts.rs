//! Persona instructions keyed by topic
//!
//! Each topic has a built-in system prompt. Any of them can be replaced by a
//! TOML file in the prompts directory, named after the topic
//! (`horoscope.toml`, `saju.toml`, `tarot.toml`) or `default.toml` for the
//! instruction used before a topic is chosen.
//!
//! # Example Prompt File
//!
//! ```toml
//! [persona]
//! name = "Tarot Reader"
//! description = "Reads three-card spreads"
//!
//! [system_prompt]
//! content = """
//! You are a warm and insightful tarot reader...
//! """
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use super::Locale;
use crate::conversation::Topic;

/// A persona/prompt template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Persona metadata
    pub persona: PersonaInfo,

    /// The system prompt
    pub system_prompt: SystemPrompt,
}

/// Persona metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInfo {
    /// Display name of the persona
    pub name: String,

    /// Brief description
    #[serde(default)]
    pub description: String,
}

/// System prompt content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// The full system prompt content
    pub content: String,
}

impl PromptTemplate {
    /// Load a template directly from a file path
    pub async fn load_from_file(path: &Path) -> Result<PromptTemplate, PromptError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| PromptError::ParseError(e.to_string()))
    }
}

/// Errors from prompt loading
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Topic → persona instruction, with a default for when no topic is set
#[derive(Debug, Clone)]
pub struct PersonaMap {
    default: String,
    topics: HashMap<Topic, String>,
}

impl PersonaMap {
    /// Built-in personas for the given locale
    pub fn builtin(locale: Locale) -> Self {
        let (default, horoscope, saju, tarot) = match locale {
            Locale::Ko => (
                builtin::ko::DEFAULT,
                builtin::ko::HOROSCOPE,
                builtin::ko::SAJU,
                builtin::ko::TAROT,
            ),
            Locale::En => (
                builtin::en::DEFAULT,
                builtin::en::HOROSCOPE,
                builtin::en::SAJU,
                builtin::en::TAROT,
            ),
        };

        Self {
            default: default.to_string(),
            topics: HashMap::from([
                (Topic::Horoscope, horoscope.to_string()),
                (Topic::Saju, saju.to_string()),
                (Topic::Tarot, tarot.to_string()),
            ]),
        }
    }

    /// Built-in personas, overridden by any prompt files found in `dir`.
    ///
    /// Missing files are silently skipped; unreadable or malformed ones are
    /// logged and the built-in text is kept.
    pub async fn load(locale: Locale, dir: &Path) -> Self {
        let mut map = Self::builtin(locale);

        if let Some(content) = load_override(&dir.join("default.toml")).await {
            map.default = content;
        }

        for topic in Topic::ALL {
            let path = dir.join(format!("{}.toml", topic.as_str()));
            if let Some(content) = load_override(&path).await {
                map.topics.insert(topic, content);
            }
        }

        map
    }

    /// Instruction for the given topic, falling back to the default
    pub fn resolve(&self, topic: Option<Topic>) -> &str {
        topic
            .and_then(|t| self.topics.get(&t))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

async fn load_override(path: &Path) -> Option<String> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return None;
    }

    match PromptTemplate::load_from_file(path).await {
        Ok(template) => {
            tracing::info!(
                "📜 Loaded persona '{}' from {}",
                template.persona.name,
                path.display()
            );
            Some(template.system_prompt.content)
        }
        Err(e) => {
            tracing::warn!("Ignoring prompt file {}: {}", path.display(), e);
            None
        }
    }
}

/// Built-in prompts that don't require files
pub mod builtin {
    pub mod ko {
        /// General fortune counselor, used until a topic is chosen
        pub const DEFAULT: &str = r#"당신은 전문적인 운세 상담사입니다.
사용자의 생년월일과 시간을 바탕으로 사주팔자, 운세, 그리고 미래에 대한 조언을 제공해주세요.
답변은 친절하고 긍정적이며, 구체적인 조언을 포함해야 합니다.
단, 절대적으로 믿을 수 없는 예측은 피하고, 현실적인 조언을 제공해주세요."#;

        pub const HOROSCOPE: &str = r#"당신은 별자리 운세 전문가입니다.
사용자의 생일로 별자리를 파악하고, 오늘과 이번 달의 운세를 연애, 재물, 건강, 일 순서로 알려주세요.
답변은 친절하고 긍정적이며, 구체적인 조언을 포함해야 합니다.
단, 절대적으로 믿을 수 없는 예측은 피하고, 현실적인 조언을 제공해주세요."#;

        pub const SAJU: &str = r#"당신은 사주팔자 전문 상담사입니다.
사용자의 생년월일과 태어난 시간을 바탕으로 사주의 네 기둥과 오행의 균형을 풀이하고, 올해의 흐름을 설명해주세요.
생년월일이나 시간이 없다면 먼저 정중하게 물어보세요.
단, 절대적으로 믿을 수 없는 예측은 피하고, 현실적인 조언을 제공해주세요."#;

        pub const TAROT: &str = r#"당신은 타로카드 리더입니다.
사용자의 질문에 대해 과거, 현재, 미래 세 장의 카드를 뽑아 각 카드의 의미와 전체적인 흐름을 풀이해주세요.
답변은 친절하고 긍정적이며, 구체적인 조언을 포함해야 합니다.
단, 절대적으로 믿을 수 없는 예측은 피하고, 현실적인 조언을 제공해주세요."#;
    }

    pub mod en {
        /// General fortune counselor, used until a topic is chosen
        pub const DEFAULT: &str = r#"You are a professional fortune counselor.
Based on the user's date and time of birth, offer readings of their fortune and advice about the future.
Be kind and positive, and include concrete advice.
Avoid predictions stated as certainties; keep your advice realistic."#;

        pub const HOROSCOPE: &str = r#"You are an astrologer specializing in horoscopes.
Work out the user's zodiac sign from their birthday and describe today's and this month's outlook for love, money, health and work.
Be kind and positive, and include concrete advice.
Avoid predictions stated as certainties; keep your advice realistic."#;

        pub const SAJU: &str = r#"You are a counselor trained in Saju (the Four Pillars of Destiny).
From the user's date and hour of birth, interpret the four pillars and the balance of the five elements, then explain the flow of the year ahead.
If the birth date or hour is missing, politely ask for it first.
Avoid predictions stated as certainties; keep your advice realistic."#;

        pub const TAROT: &str = r#"You are a tarot reader.
For the user's question, draw three cards for past, present and future, explain each card and the overall reading.
Be kind and positive, and include concrete advice.
Avoid predictions stated as certainties; keep your advice realistic."#;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        let toml_content = r#"
[persona]
name = "Test Persona"
description = "A test persona"

[system_prompt]
content = "You are a test assistant."
"#;

        let template: PromptTemplate = toml::from_str(toml_content).unwrap();
        assert_eq!(template.persona.name, "Test Persona");
        assert_eq!(template.system_prompt.content, "You are a test assistant.");
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let map = PersonaMap::builtin(Locale::Ko);
        assert_eq!(map.resolve(None), builtin::ko::DEFAULT);
        assert_eq!(map.resolve(Some(Topic::Tarot)), builtin::ko::TAROT);
    }

    #[tokio::test]
    async fn test_load_overrides_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tarot.toml"),
            "[persona]\nname = \"Custom\"\n\n[system_prompt]\ncontent = \"custom tarot\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("saju.toml"), "not toml at all [").unwrap();

        let map = PersonaMap::load(Locale::En, dir.path()).await;
        assert_eq!(map.resolve(Some(Topic::Tarot)), "custom tarot");
        assert_eq!(map.resolve(Some(Topic::Saju)), builtin::en::SAJU);
        assert_eq!(map.resolve(None), builtin::en::DEFAULT);
    }
}
