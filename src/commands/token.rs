use anyhow::{Context as _, Result, bail};

use crate::Context;
use crate::cli::{RemoteArgs, TokenCommand};
use crate::config::{Settings, TokenSource};
use crate::paths;
use crate::ui;

pub fn run(_ctx: &Context, cmd: TokenCommand) -> Result<()> {
    match cmd {
        TokenCommand::Set { token } => set(token),
        TokenCommand::Clear => clear(),
        TokenCommand::Status { remote } => status(&remote),
    }
}

fn set(token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => dialoguer::Password::new()
            .with_prompt("GitHub token")
            .interact()
            .context("Failed to read token")?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("Token cannot be empty");
    }

    let mut settings = Settings::load()?;
    settings.token = Some(token);
    settings.save()?;
    ui::success(&format!("Token stored in {}", paths::config_file()?.display()));
    Ok(())
}

fn clear() -> Result<()> {
    let mut settings = Settings::load()?;
    if settings.token.take().is_none() {
        ui::info("No token stored");
        return Ok(());
    }
    settings.save()?;
    ui::success("Stored token removed");
    Ok(())
}

fn status(remote: &RemoteArgs) -> Result<()> {
    let settings = Settings::load()?;
    let (token, source) = settings.token(remote.token.as_deref());

    ui::header("GitHub Token");
    ui::kv("Source", source.describe());
    if let Some(token) = token {
        ui::kv("Token", &mask(&token));
    }
    if source == TokenSource::Session && settings.token.is_some() {
        ui::dim("A stored token exists but is overridden for this session");
    }
    Ok(())
}

/// Show only the last four characters
fn mask(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(8))
}
