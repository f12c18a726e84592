//! Parsed template representation.
//!
//! Placeholders are `{{name}}` with optional surrounding whitespace. There is no
//! escaping, no conditionals and no loops.

use super::error::RenderError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(RenderError::Unclosed(offset + open))?;
            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(RenderError::EmptyPlaceholder(offset + open));
            }
            segments.push(Segment::Var(name.to_string()));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Segment::Var(name) = segment {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }

    /// Substitute every placeholder. `name` is only used in the error.
    pub fn render(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(var) => {
                    let value = vars.get(var).ok_or_else(|| RenderError::MissingVariable {
                        template: name.to_string(),
                        variable: var.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let template =
            Template::parse("Hi {{ name }}, your code is {{code}}. Bye {{name}}").unwrap();
        assert_eq!(template.variables(), vec!["name", "code"]);

        let vars = HashMap::from([
            ("name".to_string(), "Ada".to_string()),
            ("code".to_string(), "42".to_string()),
        ]);
        assert_eq!(
            template.render("t", &vars).unwrap(),
            "Hi Ada, your code is 42. Bye Ada"
        );
    }

    #[test]
    fn reports_malformed_placeholders() {
        assert_eq!(Template::parse("ab {{name"), Err(RenderError::Unclosed(3)));
        assert_eq!(Template::parse("x{{  }}"), Err(RenderError::EmptyPlaceholder(1)));
    }

    #[test]
    fn missing_variable_names_the_template() {
        let template = Template::parse("{{who}}").unwrap();
        assert_eq!(
            template.render("greeting", &HashMap::new()),
            Err(RenderError::MissingVariable {
                template: "greeting".into(),
                variable: "who".into()
            })
        );
    }
}
