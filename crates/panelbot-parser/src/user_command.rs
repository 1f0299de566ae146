//! Stand-alone user commands that carry no order ids.
//!
//! These are routed before the order pipeline runs: `verify <txn>` for the
//! payment-verification workflow, `account` for mapping status, and
//! `ticket <text>` for support tickets.

/// A recognized stand-alone command with its free-text argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `verify <transaction reference>`
    Verify { reference: String },
    /// `account`: show the sender's registration/mapping status.
    Account,
    /// `ticket <text>`: open a support ticket.
    Ticket { text: String },
}

/// Parse a stand-alone user command, or `None` if the text is not one.
///
/// The command keyword must be the first token; the remainder of the
/// message is the single free-text argument.
pub fn parse_user_command(text: &str) -> Option<UserCommand> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (trimmed, ""),
    };

    match head.to_lowercase().as_str() {
        "verify" | "verifikasi" => {
            if rest.is_empty() {
                None
            } else {
                Some(UserCommand::Verify {
                    reference: rest.to_string(),
                })
            }
        }
        "account" | "akun" if rest.is_empty() => Some(UserCommand::Account),
        "ticket" | "tiket" => {
            if rest.is_empty() {
                None
            } else {
                Some(UserCommand::Ticket {
                    text: rest.to_string(),
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_takes_the_rest_as_reference() {
        assert_eq!(
            parse_user_command("verify TXN-2024-001"),
            Some(UserCommand::Verify {
                reference: "TXN-2024-001".into()
            })
        );
        // Argument is free text, spaces allowed.
        assert_eq!(
            parse_user_command("verify bank transfer ref 9921"),
            Some(UserCommand::Verify {
                reference: "bank transfer ref 9921".into()
            })
        );
        assert_eq!(parse_user_command("verify"), None);
    }

    #[test]
    fn account_takes_no_argument() {
        assert_eq!(parse_user_command("account"), Some(UserCommand::Account));
        assert_eq!(parse_user_command("Account "), Some(UserCommand::Account));
        // "account 123" is not the account command.
        assert_eq!(parse_user_command("account 123"), None);
    }

    #[test]
    fn ticket_requires_text() {
        assert_eq!(
            parse_user_command("ticket my refill never arrived"),
            Some(UserCommand::Ticket {
                text: "my refill never arrived".into()
            })
        );
        assert_eq!(parse_user_command("ticket"), None);
    }

    #[test]
    fn order_commands_are_not_user_commands() {
        assert_eq!(parse_user_command("refill 123"), None);
        assert_eq!(parse_user_command("status 123"), None);
        assert_eq!(parse_user_command(""), None);
    }
}
