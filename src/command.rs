/// One parsed command line: the upper-cased verb and whatever followed it.
///
/// Parsing is purely lexical. The verb is everything up to the first run of
/// whitespace, upper-cased; the args are the rest with leading whitespace
/// removed. An empty line yields an empty verb, which the session rejects
/// as unrecognized. Argument syntax (FROM:/TO: paths) is checked by the
/// session, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: String,
    pub args: String,
}

impl Command {
    /// Parse one command line. The line terminator must already be stripped.
    pub fn parse(line: &str) -> Self {
        match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => Self {
                verb: verb.to_ascii_uppercase(),
                args: rest.trim_start().to_string(),
            },
            None => Self {
                verb: line.to_ascii_uppercase(),
                args: String::new(),
            },
        }
    }
}

/// Extract the address from a MAIL/RCPT argument.
///
/// Requires `prefix` (e.g. `FROM:`) case-insensitively at the start, then
/// returns the remainder trimmed of surrounding whitespace. `None` when the
/// prefix is missing or the remaining address is empty.
pub fn path_argument(args: &str, prefix: &str) -> Option<String> {
    if args.len() < prefix.len() {
        return None;
    }

    let (head, rest) = args.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let address = rest.trim();
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_is_uppercased() {
        let command = Command::parse("ehlo client.example");
        assert_eq!(command.verb, "EHLO");
        assert_eq!(command.args, "client.example");
    }

    #[test]
    fn verb_without_args() {
        let command = Command::parse("data");
        assert_eq!(command.verb, "DATA");
        assert_eq!(command.args, "");
    }

    #[test]
    fn empty_line_yields_empty_verb() {
        let command = Command::parse("");
        assert_eq!(command.verb, "");
        assert_eq!(command.args, "");
    }

    #[test]
    fn splits_on_first_whitespace_run() {
        let command = Command::parse("MAIL   FROM:<a@example.com>");
        assert_eq!(command.verb, "MAIL");
        assert_eq!(command.args, "FROM:<a@example.com>");
    }

    #[test]
    fn args_keep_interior_whitespace() {
        let command = Command::parse("EHLO some  spaced  identifier");
        assert_eq!(command.args, "some  spaced  identifier");
    }

    #[test]
    fn path_argument_accepts_any_prefix_casing() {
        for args in ["FROM:<a@example.com>", "from:<a@example.com>", "From:<a@example.com>"] {
            assert_eq!(
                path_argument(args, "FROM:").as_deref(),
                Some("<a@example.com>")
            );
        }
    }

    #[test]
    fn path_argument_trims_surrounding_whitespace() {
        assert_eq!(
            path_argument("TO:  <b@example.com>  ", "TO:").as_deref(),
            Some("<b@example.com>")
        );
    }

    #[test]
    fn path_argument_rejects_wrong_prefix() {
        assert_eq!(path_argument("FRO:<a@example.com>", "FROM:"), None);
        assert_eq!(path_argument("FROM<a@example.com>", "FROM:"), None);
        assert_eq!(path_argument("", "FROM:"), None);
    }

    #[test]
    fn path_argument_rejects_empty_address() {
        assert_eq!(path_argument("FROM:", "FROM:"), None);
        assert_eq!(path_argument("FROM:   ", "FROM:"), None);
    }
}
