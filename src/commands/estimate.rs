use anyhow::{Context as _, Result};
use flatkit::{Client, EnumerationEstimate, RepositoryLocation, location};
use serde::Serialize;

use crate::Context;
use crate::cli::EstimateArgs;
use crate::commands::interrupt;
use crate::config::Settings;
use crate::progress::WalkSpinner;
use crate::ui;

#[derive(Serialize)]
struct EstimateReport<'a> {
    location: &'a RepositoryLocation,
    #[serde(flatten)]
    estimate: EnumerationEstimate,
}

pub fn run(ctx: &Context, args: EstimateArgs) -> Result<()> {
    let root = location::parse_reference(&args.url)?;
    let settings = Settings::load()?;
    let (token, source) = settings.token(args.remote.token.as_deref());
    log::debug!("GitHub token: {}", source.describe());

    let client = Client::new(token);
    let armed = interrupt::arm()?;
    let spinner = WalkSpinner::new("Estimating", ctx.quiet || args.json);
    let result = client.estimate_with(&root, armed.flag(), &spinner);
    spinner.finish();
    drop(armed);

    let estimate = match result {
        Ok(estimate) => estimate,
        Err(e) if e.is_aborted() => {
            ui::warn("Repo Download Failed: User Aborted");
            return Ok(());
        }
        Err(e) => {
            ui::dim(e.category().advice());
            return Err(e).with_context(|| format!("Could not estimate {root}"));
        }
    };

    if args.json {
        println!("{}", render_json(&root, estimate)?);
        return Ok(());
    }

    ui::header(&root.to_string());
    ui::kv("Files", &estimate.file_count.to_string());
    ui::kv("Total size", &ui::format_size(estimate.total_size));
    Ok(())
}

fn render_json(root: &RepositoryLocation, estimate: EnumerationEstimate) -> Result<String> {
    let report = EstimateReport {
        location: root,
        estimate,
    };
    serde_json::to_string_pretty(&report).context("Could not serialize estimate")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json() {
        let root =
            location::parse_reference("https://github.com/octo/hello/tree/dev/docs").unwrap();
        let estimate = EnumerationEstimate {
            file_count: 3,
            total_size: 60,
        };
        let rendered = render_json(&root, estimate).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(json["file_count"], 3);
        assert_eq!(json["total_size"], 60);
        assert_eq!(json["location"]["owner"], "octo");
        assert_eq!(json["location"]["branch"], "dev");
        assert_eq!(json["location"]["subpath"], "docs");
    }
}
