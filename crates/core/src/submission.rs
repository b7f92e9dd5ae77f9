use serde_json::{Map, Value};
use thiserror::Error;

/// Marker for a line carrying a structured command instead of chat text.
pub const OOB_PREFIX: &str = "##send ";

/// A structured instruction sent to the runtime outside the text channel.
#[derive(Clone, Debug, PartialEq)]
pub struct OobCommand {
    pub name: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

#[derive(Error, Debug)]
pub enum OobError {
    #[error("malformed command payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("command name must not be empty")]
    EmptyName,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Submission<'a> {
    Text(&'a str),
    Command(OobCommand),
}

/// Split pasted or multi-line input into the lines to submit.
///
/// Any run of `\r`/`\n` separates two lines; empty fragments are dropped.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n']).filter(|l| !l.is_empty()).collect()
}

/// Decide whether a line is plain text or an out-of-band command.
pub fn classify(line: &str) -> Result<Submission<'_>, OobError> {
    if line.len() <= OOB_PREFIX.len() {
        return Ok(Submission::Text(line));
    }
    match line.strip_prefix(OOB_PREFIX) {
        Some(payload) => parse_command(payload).map(Submission::Command),
        None => Ok(Submission::Text(line)),
    }
}

fn parse_command(payload: &str) -> Result<OobCommand, OobError> {
    let (name, args, kwargs): (String, Vec<Value>, Map<String, Value>) =
        serde_json::from_str(payload)?;
    if name.trim().is_empty() {
        return Err(OobError::EmptyName);
    }
    Ok(OobCommand { name, args, kwargs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_collapses_separator_runs() {
        assert_eq!(split_lines("look\r\n\r\nnorth\n"), vec!["look", "north"]);
        assert_eq!(split_lines("\n\nsay hi\r"), vec!["say hi"]);
        assert_eq!(split_lines("one line"), vec!["one line"]);
    }

    #[test]
    fn split_of_blank_input_is_empty() {
        assert!(split_lines("").is_empty());
        assert!(split_lines("\r\n\n").is_empty());
    }

    #[test]
    fn split_keeps_whitespace_lines() {
        assert_eq!(split_lines("a\n  \nb"), vec!["a", "  ", "b"]);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(classify("look").unwrap(), Submission::Text("look"));
        assert_eq!(classify("#send x").unwrap(), Submission::Text("#send x"));
    }

    #[test]
    fn bare_prefix_is_text() {
        assert_eq!(classify("##send ").unwrap(), Submission::Text("##send "));
    }

    #[test]
    fn parses_command_tuple() {
        let got = classify(r#"##send ["pose",["waves"],{}]"#).unwrap();
        assert_eq!(
            got,
            Submission::Command(OobCommand {
                name: "pose".into(),
                args: vec![json!("waves")],
                kwargs: Map::new(),
            })
        );
    }

    #[test]
    fn parses_kwargs() {
        let got = classify(r#"##send ["get_map", [], {"radius": 3, "legend": true}]"#).unwrap();
        let Submission::Command(cmd) = got else {
            panic!("expected command");
        };
        assert_eq!(cmd.name, "get_map");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.kwargs.get("radius"), Some(&json!(3)));
        assert_eq!(cmd.kwargs.get("legend"), Some(&json!(true)));
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(
            classify("##send not json"),
            Err(OobError::Payload(_))
        ));
        assert!(matches!(
            classify(r#"##send ["pose", "waves", {}]"#),
            Err(OobError::Payload(_))
        ));
        assert!(matches!(
            classify(r#"##send ["pose", []]"#),
            Err(OobError::Payload(_))
        ));
        assert!(matches!(
            classify(r#"##send ["", [], {}]"#),
            Err(OobError::EmptyName)
        ));
    }
}
