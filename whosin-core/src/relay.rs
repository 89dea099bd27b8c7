// ABOUTME: Formats chat messages as server console commands for the chat-to-server relay
// ABOUTME: Flattens multi-line bodies and wraps the rendered text in a `say` command

use crate::template;

/// Build the console command that broadcasts a chat message in-game.
///
/// `format` takes `{0}` = sender and `{1}` = body. Line breaks in the body are
/// replaced by a single space so the command stays on one console line. The
/// returned command includes its terminating `\n`.
pub fn console_command(format: &str, sender: &str, body: &str) -> String {
    let body = flatten_lines(body);
    let sender = flatten_lines(sender);
    format!("say {}\n", template::render(format, &[sender.as_str(), body.as_str()]))
}

fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_command_default_format() {
        assert_eq!(
            console_command("<{0}> {1}", "Alice", "hello there"),
            "say <Alice> hello there\n"
        );
    }

    #[test]
    fn test_console_command_flattens_newlines() {
        assert_eq!(
            console_command("<{0}> {1}", "Alice", "line one\nline two\r\nline three"),
            "say <Alice> line one line two line three\n"
        );
    }

    #[test]
    fn test_console_command_each_newline_becomes_one_space() {
        assert_eq!(console_command("{1}", "x", "a\n\nb"), "say a  b\n");
    }

    #[test]
    fn test_console_command_sender_cannot_inject_lines() {
        assert_eq!(
            console_command("<{0}> {1}", "evil\nstop", "hi"),
            "say <evil stop> hi\n"
        );
    }
}
