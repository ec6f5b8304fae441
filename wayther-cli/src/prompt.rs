use anyhow::Result;
use inquire::{Password, PasswordDisplayMode, Text, required};
use std::path::Path;
use wayther_core::ConfigPrompter;

/// Interactive config creation on the terminal.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl ConfigPrompter for InquirePrompter {
    fn api_key(&self) -> Result<String> {
        let key = Password::new("Enter WeatherAPI key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(required!("API key cannot be empty for the default configuration."))
            .prompt()?;
        Ok(key)
    }

    fn location(&self) -> Result<String> {
        let location = Text::new("Enter location:")
            .with_validator(required!("Location cannot be empty."))
            .prompt()?;
        Ok(location)
    }

    fn created(&self, path: &Path) {
        eprintln!("Created configuration file: {}", path.display());
    }
}
