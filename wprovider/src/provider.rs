use std::fmt::{Display, Formatter};

/// Upstream provider that produced a streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderId {
    Anthropic,
    OpenAi,
    #[default]
    Unknown,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [Self::Anthropic, Self::OpenAi, Self::Unknown];

    /// Maps a backend-reported provider name; anything unrecognized is `Unknown`.
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Self::Anthropic,
            "openai" => Self::OpenAi,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ProviderId;

    #[test]
    fn from_name_is_case_insensitive_and_defaults_to_unknown() {
        assert_eq!(ProviderId::from_name("anthropic"), ProviderId::Anthropic);
        assert_eq!(ProviderId::from_name(" OpenAI "), ProviderId::OpenAi);
        assert_eq!(ProviderId::from_name("mistral"), ProviderId::Unknown);
        assert_eq!(ProviderId::from_name(""), ProviderId::Unknown);
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(ProviderId::Anthropic.to_string(), "anthropic");
        assert_eq!(ProviderId::OpenAi.to_string(), "openai");
        assert_eq!(ProviderId::Unknown.to_string(), "unknown");
        assert!(!ProviderId::Unknown.is_known());
    }
}
