use std::fmt;

use serde::{Deserialize, Serialize};

use crate::log::mask_token;

/// Language preference used for API responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "tc")]
    Traditional,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Traditional, Locale::English];

    /// Value used in form submissions and stored entry data.
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Traditional => "tc",
            Locale::English => "en",
        }
    }

    /// Tag sent in the `accept-language` header.
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::Traditional => "zh-HK",
            Locale::English => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form submission for the `user` step, persisted verbatim as entry data on success.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub locale: Locale,
}

impl Credentials {
    pub fn new(token: impl Into<String>, locale: Locale) -> Self {
        Self {
            token: token.into(),
            locale,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &mask_token(&self.token))
            .field("locale", &self.locale)
            .finish()
    }
}
