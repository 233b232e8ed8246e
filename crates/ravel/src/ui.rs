//! Small helpers shared by the interactive commands.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{self, AsyncBufReadExt};

pub const BAR_CHAR: &str = "▎";

/// Starts an animated spinner with a message.
pub fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let bar = ProgressBar::new_spinner();
    bar.set_style(style);
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Reads one line from stdin, or `None` on EOF.
pub async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

/// Whether the input is one of the conversation-ending sentinels.
pub fn is_quit(line: &str) -> bool {
    matches!(line, "quit" | "exit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_sentinels() {
        assert!(is_quit("quit"));
        assert!(is_quit("exit"));
        assert!(is_quit("q"));
        assert!(!is_quit("quite"));
        assert!(!is_quit(""));
    }
}
