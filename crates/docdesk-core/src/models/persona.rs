use serde::{Deserialize, Serialize};

pub const PERSONAS_CONTAINER: &str = "Personas";

/// A reviewer persona whose text is prepended to extraction prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    pub id: String,
    #[serde(rename = "personaID")]
    pub persona_id: String,
    #[serde(rename = "personaName")]
    pub persona_name: String,
    #[serde(rename = "personaText", default)]
    pub persona_text: String,
}

impl Persona {
    /// Display name for a persona id, falling back to the id itself.
    pub fn display_name<'a>(personas: &'a [Persona], persona_id: &'a str) -> &'a str {
        personas
            .iter()
            .find(|p| p.persona_id == persona_id)
            .map(|p| p.persona_name.as_str())
            .unwrap_or(persona_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_keep_id_suffix_uppercase() {
        let persona: Persona = serde_json::from_str(
            r#"{"id":"1","personaID":"uw","personaName":"Underwriter","personaText":"You review loans."}"#,
        )
        .unwrap();
        assert_eq!(persona.persona_id, "uw");

        let json = serde_json::to_value(&persona).unwrap();
        assert_eq!(json["personaID"], "uw");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let personas = vec![Persona {
            id: "1".to_string(),
            persona_id: "uw".to_string(),
            persona_name: "Underwriter".to_string(),
            persona_text: String::new(),
        }];
        assert_eq!(Persona::display_name(&personas, "uw"), "Underwriter");
        assert_eq!(Persona::display_name(&personas, "legal"), "legal");
    }
}
