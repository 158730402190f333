//! Terminal helpers.

use std::io::Write;

/// Redisplay the input prompt after asynchronous output.
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
