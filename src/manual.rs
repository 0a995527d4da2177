use crate::browser::{KEY_SELECTORS, MANUAL_ONLY_SELECTORS};
use crate::display::{manual_guidance, print_error, print_info};
use crate::error::SupakeyError;
use crate::input::Prompter;
use crate::validation::validate_api_key;

const PASTE_PROMPT: &str = "🔑 Paste the anon public API key here: ";

/// Walk the operator through copying the key by hand, re-prompting until a
/// pasted value passes validation. Only cancellation ends the loop early.
pub fn manual_extraction(
    dashboard_url: &str,
    prompter: &mut dyn Prompter,
) -> Result<String, SupakeyError> {
    let selectors: Vec<&str> = KEY_SELECTORS
        .iter()
        .chain(MANUAL_ONLY_SELECTORS)
        .copied()
        .collect();
    println!("{}", manual_guidance(dashboard_url, &selectors));

    loop {
        let input = prompter.read_secret(PASTE_PROMPT)?;
        let key = input.trim();

        match validate_api_key(key) {
            Ok(()) => return Ok(key.to_string()),
            Err(reason) => {
                print_error(&format!("❌ Error: {}", reason));
                print_info("Please try again or press Ctrl+C to exit.");
            }
        }
    }
}
