//! Minimal template expander for the bootstrap command
//!
//! Two tag forms:
//!
//! - `{{NAME}}` interpolates a variable, quoted for the shell context it lands in
//! - `{{if NAME}}...{{end}}` emits its body only when `NAME` is `"true"`
//!
//! Every referenced name must resolve, including names inside suppressed
//! blocks.
//!
//! The quoting context of a slot is tracked over the emitted text. Values
//! never introduce a raw newline: inside quotes a newline is spliced in as
//! `$'\n'`, so the expansion survives being folded onto one line.

use super::variables::CseVariables;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Names only; values never appear in template errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references unknown variable {name}")]
    UnknownVariable { name: String },

    #[error("unbalanced template block: {detail}")]
    UnbalancedBlock { detail: &'static str },

    #[error("unterminated template tag at byte {offset}")]
    UnterminatedTag { offset: usize },
}

enum Tag<'t> {
    Var(&'t str),
    If(&'t str),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Shell quoting state after the text emitted so far
#[derive(Debug, Clone, Copy)]
struct QuoteState {
    quote: Quote,
    escaped: bool,
}

impl QuoteState {
    fn new() -> Self {
        Self {
            quote: Quote::None,
            escaped: false,
        }
    }

    fn scan(&mut self, text: &str) {
        for c in text.chars() {
            if self.escaped {
                self.escaped = false;
                continue;
            }
            self.quote = match (self.quote, c) {
                (Quote::None, '\\') | (Quote::Double, '\\') => {
                    self.escaped = true;
                    self.quote
                }
                (Quote::None, '\'') => Quote::Single,
                (Quote::None, '"') => Quote::Double,
                (Quote::Single, '\'') | (Quote::Double, '"') => Quote::None,
                (quote, _) => quote,
            };
        }
    }

    fn render(&self, value: &str) -> String {
        match self.quote {
            Quote::Double => escape_double_quoted(value),
            Quote::Single => escape_single_quoted(value),
            Quote::None => quote_word(value),
        }
    }
}

fn parse_tag(raw: &str) -> Tag<'_> {
    let tag = raw.trim();
    if tag == "end" {
        Tag::End
    } else if let Some(name) = tag.strip_prefix("if ") {
        Tag::If(name.trim())
    } else {
        Tag::Var(tag)
    }
}

pub fn expand(template: &str, vars: &CseVariables) -> Result<String, TemplateError> {
    let lookup = |name: &str| {
        vars.get(name).ok_or_else(|| TemplateError::UnknownVariable {
            name: name.to_string(),
        })
    };

    let mut output = String::with_capacity(template.len() * 2);
    let mut blocks: Vec<bool> = Vec::new();
    let mut state = QuoteState::new();
    let mut rest = template;
    let mut consumed = 0;

    while let Some(start) = rest.find(OPEN) {
        let emitting = blocks.iter().all(|open| *open);
        if emitting {
            output.push_str(&rest[..start]);
            state.scan(&rest[..start]);
        }

        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(TemplateError::UnterminatedTag {
                offset: consumed + start,
            })?;

        match parse_tag(&after_open[..end]) {
            Tag::Var(name) => {
                let value = lookup(name)?;
                if emitting {
                    output.push_str(&state.render(value));
                }
            }
            Tag::If(name) => blocks.push(lookup(name)? == "true"),
            Tag::End => {
                blocks.pop().ok_or(TemplateError::UnbalancedBlock {
                    detail: "{{end}} without matching {{if}}",
                })?;
            }
        }

        let advance = start + OPEN.len() + end + CLOSE.len();
        consumed += advance;
        rest = &rest[advance..];
    }

    if !blocks.is_empty() {
        return Err(TemplateError::UnbalancedBlock {
            detail: "{{if}} without matching {{end}}",
        });
    }

    output.push_str(rest);
    Ok(output)
}

/// Body of a `"..."` word: backslash-escape what stays special, splice newlines
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\"$'\\n'\""),
            '\\' | '"' | '$' | '`' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Body of a `'...'` word
pub fn escape_single_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => escaped.push_str("'\\''"),
            '\n' => escaped.push_str("'$'\\n''"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A complete shell word; plain tokens pass through, anything else is single-quoted
pub fn quote_word(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_plain_word_char) {
        value.to_string()
    } else {
        format!("'{}'", escape_single_quoted(value))
    }
}

fn is_plain_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | ':' | '/' | '=' | '+' | '@' | '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> CseVariables {
        let mut vars = CseVariables::default();
        for (k, v) in pairs {
            vars.set(k, v);
        }
        vars
    }

    #[test]
    fn test_interpolation_escapes_shell_characters() {
        let vars = vars(&[("MOTD", r#"say "hi" $USER `id` \n"#)]);
        let out = expand(r#"MOTD="{{MOTD}}""#, &vars).unwrap();
        assert_eq!(out, r#"MOTD="say \"hi\" \$USER \`id\` \\n""#);
    }

    #[test]
    fn test_slot_escaping_follows_quote_context() {
        let vars = vars(&[("V", "it's $HOME"), ("N", "42"), ("E", "")]);

        assert_eq!(expand(r#"A="{{V}}""#, &vars).unwrap(), r#"A="it's \$HOME""#);
        assert_eq!(expand("A={{V}}", &vars).unwrap(), r"A='it'\''s $HOME'");
        assert_eq!(expand("A='{{V}}'", &vars).unwrap(), r"A='it'\''s $HOME'");
        assert_eq!(expand("A={{N}} B={{E}}", &vars).unwrap(), "A=42 B=''");
    }

    #[test]
    fn test_quote_context_tracks_emitted_text_only() {
        let vars = vars(&[("OFF", "false"), ("N", "1 2")]);
        let out = expand(r#"echo 'a"b' \" {{if OFF}}"{{end}}X={{N}}"#, &vars).unwrap();
        assert_eq!(out, r#"echo 'a"b' \" X='1 2'"#);
    }

    #[test]
    fn test_newlines_never_reach_the_output() {
        let vars = vars(&[("PEM", "-----BEGIN\nabc\n-----END")]);

        let quoted = expand(r#"CRT="{{PEM}}""#, &vars).unwrap();
        assert_eq!(quoted, r#"CRT="-----BEGIN"$'\n'"abc"$'\n'"-----END""#);

        let bare = expand("CRT={{PEM}}", &vars).unwrap();
        assert_eq!(bare, r"CRT='-----BEGIN'$'\n''abc'$'\n''-----END'");

        assert!(!quoted.contains('\n') && !bare.contains('\n'));
    }

    #[test]
    fn test_conditional_blocks() {
        let vars = vars(&[("ON", "true"), ("OFF", "false"), ("X", "x")]);
        let out = expand("a{{if ON}}b{{X}}{{if OFF}}c{{end}}d{{end}}e", &vars).unwrap();
        assert_eq!(out, "abxde");
    }

    #[test]
    fn test_unknown_variable_even_in_suppressed_block() {
        let vars = vars(&[("OFF", "false")]);
        assert_eq!(
            expand("{{if OFF}}{{MISSING}}{{end}}", &vars),
            Err(TemplateError::UnknownVariable {
                name: "MISSING".to_string()
            })
        );
    }

    #[test]
    fn test_unbalanced_blocks() {
        let vars = vars(&[("ON", "true")]);
        assert!(matches!(
            expand("{{if ON}}open", &vars),
            Err(TemplateError::UnbalancedBlock { .. })
        ));
        assert!(matches!(
            expand("close{{end}}", &vars),
            Err(TemplateError::UnbalancedBlock { .. })
        ));
        assert_eq!(
            expand("ab{{ON", &vars),
            Err(TemplateError::UnterminatedTag { offset: 2 })
        );
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(expand("echo ${HOME} }}", &CseVariables::default()).unwrap(), "echo ${HOME} }}");
    }
}
