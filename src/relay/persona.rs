//! Built-in system prompts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named system prompt plus whether replies are stripped of markdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Friendly senior student mentor, step-by-step explanations
    #[default]
    Mentor,
    /// Same mentor, short answers
    Concise,
    /// Guides the student with questions instead of handing out answers
    Socratic,
    /// Mentor for plain-text front ends; replies are cleaned of markdown
    Plain,
}

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::Mentor,
        Persona::Concise,
        Persona::Socratic,
        Persona::Plain,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Persona::Mentor => "mentor",
            Persona::Concise => "concise",
            Persona::Socratic => "socratic",
            Persona::Plain => "plain",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Persona::Mentor => {
                "You are MentorBot, a friendly senior student mentor. \
                 Explain concepts very clearly, simply, and step-by-step. \
                 Never use complicated terms unless necessary, and always stay positive and motivating."
            }
            Persona::Concise => {
                "You are MentorBot, a friendly senior student mentor. \
                 Answer in a few short sentences, using simple words. \
                 Offer to go deeper only if the student asks."
            }
            Persona::Socratic => {
                "You are MentorBot, a patient senior student mentor. \
                 Help the student reach the answer themselves by asking one guiding question at a time, \
                 and confirm their reasoning when they get there. Stay encouraging."
            }
            Persona::Plain => {
                "You are MentorBot, a friendly senior student mentor. \
                 Explain concepts clearly, simply, and step-by-step. \
                 Write plain text only: no markdown, no headings, no bullet symbols, no bold or italics."
            }
        }
    }

    /// Whether replies should go through the markdown cleaning filter
    pub fn cleans_output(&self) -> bool {
        matches!(self, Persona::Plain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown persona '{0}' (expected mentor, concise, socratic or plain)")]
pub struct UnknownPersona(pub String);

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Persona::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
