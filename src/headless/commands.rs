//! Operator commands read from stdin in headless mode

use chargepanel_app::form::FormField;
use chargepanel_app::{CurrentPreset, Message};

/// Turn one stdin line into the messages it stands for.
///
/// An empty line yields no messages. Errors carry a short reason for the
/// operator.
pub fn parse_command(line: &str) -> Result<Vec<Message>, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let messages = match command {
        "" => vec![],

        "set" => {
            let (field, value) = split_arg(rest, "set <field> <value>")?;
            let field: FormField = field.parse().map_err(|e| format!("{}", e))?;
            vec![Message::FieldEdited {
                field,
                value: value.to_string(),
            }]
        }

        "host" => {
            let (index, value) = split_arg(rest, "host <index> <host>")?;
            vec![Message::ChargerHostEdited {
                index: parse_index(index)?,
                value: value.to_string(),
            }]
        }

        "save" => vec![Message::SubmitConfig],

        "current" => {
            if rest.is_empty() {
                return Err("usage: current <amps>".to_string());
            }
            vec![
                Message::AvailableCurrentEdited {
                    value: rest.to_string(),
                },
                Message::SubmitAvailableCurrent,
            ]
        }

        "preset" => match rest {
            "max" => vec![Message::AvailableCurrentPreset(CurrentPreset::Maximum)],
            "min" => vec![Message::AvailableCurrentPreset(CurrentPreset::Minimum)],
            _ => return Err("expected 'max' or 'min'".to_string()),
        },

        "remove" => vec![Message::RemoveCharger {
            index: parse_index(rest)?,
        }],

        "add" => {
            let (host, name) = split_arg(rest, "add <host> <name>")?;
            vec![Message::AddCharger {
                host: host.to_string(),
                name: name.to_string(),
            }]
        }

        "reboot" => vec![Message::RebootConfirmed],
        "later" => vec![Message::RebootDismissed],

        "dismiss" => {
            if rest.is_empty() {
                return Err("usage: dismiss <alert id>".to_string());
            }
            vec![Message::DismissAlert {
                id: rest.to_string(),
            }]
        }

        "q" | "quit" => vec![Message::Quit],

        other => return Err(format!("unknown command '{}'", other)),
    };

    Ok(messages)
}

/// Split `rest` into its first word and the remainder, both required
fn split_arg<'a>(rest: &'a str, usage: &str) -> Result<(&'a str, &'a str), String> {
    match rest.split_once(char::is_whitespace) {
        Some((first, remainder)) if !remainder.trim().is_empty() => Ok((first, remainder.trim())),
        _ => Err(format!("usage: {}", usage)),
    }
}

fn parse_index(text: &str) -> Result<usize, String> {
    text.parse()
        .map_err(|_| format!("'{}' is not a charger index", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_parses_field_name() {
        let messages = parse_command("set minimum_current 6.5").unwrap();

        assert!(matches!(
            messages.as_slice(),
            [Message::FieldEdited { field: FormField::MinimumCurrent, value }] if value == "6.5"
        ));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(parse_command("set colour blue").is_err());
    }

    #[test]
    fn test_current_edits_then_submits() {
        let messages = parse_command("current 16").unwrap();

        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], Message::SubmitAvailableCurrent));
    }

    #[test]
    fn test_add_keeps_spaces_in_name() {
        let messages = parse_command("add 10.0.0.5 Shed by the gate").unwrap();

        assert!(matches!(
            messages.as_slice(),
            [Message::AddCharger { host, name }] if host == "10.0.0.5" && name == "Shed by the gate"
        ));
    }

    #[test]
    fn test_remove_requires_index() {
        assert!(parse_command("remove").is_err());
        assert!(parse_command("remove two").is_err());
        assert!(matches!(
            parse_command("remove 2").unwrap().as_slice(),
            [Message::RemoveCharger { index: 2 }]
        ));
    }

    #[test]
    fn test_empty_line_is_a_no_op() {
        assert!(parse_command("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_command("launch rockets").unwrap_err();
        assert!(err.contains("launch"));
    }
}
