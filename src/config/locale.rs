//! User-facing texts in each supported locale

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conversation::Topic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" | "ko-kr" | "korean" => Ok(Locale::Ko),
            "en" | "en-us" | "english" => Ok(Locale::En),
            other => Err(format!("unsupported locale '{other}'")),
        }
    }
}

/// Usage notes shown next to the chat
#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub steps: Vec<&'static str>,
    pub cautions: Vec<&'static str>,
}

impl Locale {
    pub fn greeting(&self) -> &'static str {
        match self {
            Locale::Ko => "안녕하세요! 어떤 방식으로 운세를 봐드릴까요?",
            Locale::En => "Hello! How would you like your fortune told today?",
        }
    }

    pub fn credential_missing(&self) -> &'static str {
        match self {
            Locale::Ko => "죄송합니다. API 키가 설정되지 않아 답변을 드릴 수 없습니다. 관리자에게 문의해주세요.",
            Locale::En => "Sorry, the API key is not configured, so I can't answer right now. Please contact the administrator.",
        }
    }

    /// Apology wrapped around a provider failure description
    pub fn provider_failure(&self, description: &str) -> String {
        match self {
            Locale::Ko => format!("죄송합니다. 오류가 발생했습니다: {description}"),
            Locale::En => format!("Sorry, something went wrong: {description}"),
        }
    }

    pub fn topic_label(&self, topic: Topic) -> &'static str {
        match (self, topic) {
            (Locale::Ko, Topic::Horoscope) => "별자리 운세",
            (Locale::Ko, Topic::Saju) => "사주팔자",
            (Locale::Ko, Topic::Tarot) => "타로카드",
            (Locale::En, Topic::Horoscope) => "Horoscope",
            (Locale::En, Topic::Saju) => "Four Pillars",
            (Locale::En, Topic::Tarot) => "Tarot",
        }
    }

    /// What the user "says" when tapping a topic button
    pub fn topic_request(&self, topic: Topic) -> &'static str {
        match (self, topic) {
            (Locale::Ko, Topic::Horoscope) => "별자리 운세를 보고 싶어요.",
            (Locale::Ko, Topic::Saju) => "사주팔자를 보고 싶어요.",
            (Locale::Ko, Topic::Tarot) => "타로카드로 운세를 보고 싶어요.",
            (Locale::En, topic) => topic.as_str(),
        }
    }

    pub fn guide(&self) -> Guide {
        match self {
            Locale::Ko => Guide {
                steps: vec![
                    "원하는 운세 유형을 선택해주세요",
                    "생년월일과 시간을 입력해주세요",
                    "궁금하신 점을 자유롭게 물어보세요",
                    "AI가 상세한 운세를 알려드립니다",
                ],
                cautions: vec![
                    "이 서비스는 재미로만 참고해주세요",
                    "중요한 인생 결정은 전문가와 상담하시기 바랍니다",
                    "개인정보는 안전하게 보호됩니다",
                ],
            },
            Locale::En => Guide {
                steps: vec![
                    "Pick the kind of fortune you want",
                    "Enter your date and time of birth",
                    "Ask anything you are curious about",
                    "The AI reads your fortune in detail",
                ],
                cautions: vec![
                    "This service is for entertainment only",
                    "Consult a professional before major life decisions",
                    "Your personal information is kept safe",
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("ko-KR".parse::<Locale>().unwrap(), Locale::Ko);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_provider_failure_embeds_description() {
        let text = Locale::En.provider_failure("rate limited");
        assert!(text.ends_with("rate limited"));
    }

    #[test]
    fn test_english_request_is_topic_id() {
        assert_eq!(Locale::En.topic_request(Topic::Horoscope), "horoscope");
    }
}
