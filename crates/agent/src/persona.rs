//! Persona directives: the static system prompt used for final synthesis.

use vantage_config::PersonaConfig;

/// The assistant's voice and the rules it follows when using context.
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    directives: String,
}

impl Persona {
    /// Built-in directives for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let directives = default_directives(&name);
        Self { name, directives }
    }

    /// Use `directives` verbatim as the system prompt.
    pub fn with_directives(name: impl Into<String>, directives: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: directives.into(),
        }
    }

    pub fn from_config(config: &PersonaConfig) -> Self {
        match config
            .system_prompt_override
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            Some(prompt) => Self::with_directives(&config.name, prompt),
            None => Self::new(&config.name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.directives
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new("Vantage")
    }
}

fn default_directives(name: &str) -> String {
    format!(
        "You are {name}, a precise research assistant.\n\
         \n\
         Rules:\n\
         - Lead with the answer, then the supporting detail. Keep it tight.\n\
         - When a \"Retrieved Intelligence\" section is present, ground factual claims in it \
         and mention its source. Treat its confidence as a hint of how hedged you should be.\n\
         - When the retrieved section is a SILENCE PROTOCOL notice, say plainly that no current \
         external signal was found and answer from general knowledge, flagging anything that \
         may be out of date.\n\
         - Use the conversation memory for continuity. Never invent earlier turns.\n\
         - If the user asked you to save or track something, confirm it briefly."
    )
}
