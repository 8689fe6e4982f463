use anyhow::Result;
use flatkit::names;

use crate::Context;
use crate::cli::{ConfigCommand, ConfigKey};
use crate::config::{Settings, validate_delimiter};
use crate::paths;
use crate::ui;

pub fn run(_ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
        ConfigCommand::Set { key, value } => set(key, value),
        ConfigCommand::Path => path(),
    }
}

fn show() -> Result<()> {
    let file = paths::config_file()?;
    let settings = Settings::load()?;

    ui::header("Configuration");
    ui::kv("Config file", &file.display().to_string());
    if !file.exists() {
        ui::dim("Not found, using defaults");
    }
    println!();
    ui::kv("Delimiter", &settings.delimiter(None)?);
    ui::kv("Output", &settings.output(None).display().to_string());
    let (_, source) = settings.token(None);
    ui::kv("Token", source.describe());
    Ok(())
}

fn set(key: ConfigKey, value: String) -> Result<()> {
    let mut settings = Settings::load()?;
    match key {
        ConfigKey::Delimiter => {
            validate_delimiter(&value)?;
            if !names::unsafe_chars(&value).is_empty() {
                ui::warn("Delimiter contains characters some file systems reject");
            }
            settings.delimiter = Some(value);
        }
        ConfigKey::Output => settings.output = Some(value),
    }
    settings.save()?;
    ui::success("Configuration saved");
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", paths::config_file()?.display());
    Ok(())
}
