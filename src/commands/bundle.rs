//! `foldflat bundle`: select local paths and GitHub trees, flatten, zip.
//!
//! Local selections come first, then each `--repo` in the order given.
//! Every repository goes through an estimate pass, an optional
//! confirmation, and a commit pass; either pass can be cancelled with
//! Ctrl-C without losing the rest of the selection.

use anyhow::{Context as _, Result, bail};
use flatkit::archive::Assembly;
use flatkit::{
    Client, EnumerationEstimate, FileDescriptor, FlattenedFile, RepositoryLocation, local,
    location, names,
};
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::BundleArgs;
use crate::commands::interrupt;
use crate::config::Settings;
use crate::paths;
use crate::progress::{AssemblyReporter, WalkSpinner};
use crate::ui;

pub fn run(ctx: &Context, args: BundleArgs) -> Result<()> {
    if args.paths.is_empty() && args.repos.is_empty() {
        bail!("Nothing to bundle: pass local paths and/or --repo <URL>");
    }

    let settings = Settings::load()?;
    let delimiter = settings.delimiter(args.delimiter.as_deref())?;
    warn_unsafe_delimiter(&delimiter);
    let output = settings.output(args.output.as_deref());

    let (token, source) = settings.token(args.remote.token.as_deref());
    log::debug!("GitHub token: {}", source.describe());
    let client = Client::new(token);

    let mut descriptors = select_local(&args.paths)?;
    if !descriptors.is_empty() && !ctx.quiet {
        ui::info(&format!(
            "Selected {} from local paths",
            ui::plural(descriptors.len() as u64, "file")
        ));
    }

    for url in &args.repos {
        if let Some(remote) = select_remote(ctx, &client, url, args.yes)? {
            descriptors.extend(remote);
        }
    }

    if descriptors.is_empty() {
        ui::info("No files selected, nothing to write.");
        return Ok(());
    }

    let files = names::flatten_all(&descriptors, &delimiter);

    if args.dry_run {
        preview(&files);
        return Ok(());
    }

    let assembly = write_archive(ctx, &client, &files, &output)?;
    report(&assembly, files.len(), &output);
    Ok(())
}

fn warn_unsafe_delimiter(delimiter: &str) {
    let unsafe_chars = names::unsafe_chars(delimiter);
    if !unsafe_chars.is_empty() {
        let shown: String = unsafe_chars.iter().collect();
        ui::warn(&format!(
            "Delimiter {delimiter:?} contains {shown:?}, which some file systems reject"
        ));
    }
}

fn select_local(paths: &[PathBuf]) -> Result<Vec<FileDescriptor>> {
    let expanded: Vec<PathBuf> = paths
        .iter()
        .map(|p| paths::expand(&p.to_string_lossy()))
        .collect();
    local::select_all(&expanded).context("Could not read local selection")
}

/// Estimate, confirm, and collect one repository.
///
/// Returns `None` when the user cancels or declines.
fn select_remote(
    ctx: &Context,
    client: &Client,
    url: &str,
    yes: bool,
) -> Result<Option<Vec<FileDescriptor>>> {
    let root = location::parse_reference(url)?;
    log::info!("Selecting {root}");

    let Some(estimate) = estimate_remote(ctx, client, &root)? else {
        return Ok(None);
    };

    if !ctx.quiet {
        ui::info(&format!(
            "{root}: {} ({})",
            ui::plural(estimate.file_count, "file"),
            ui::format_size(estimate.total_size)
        ));
    }

    if estimate.file_count == 0 {
        ui::dim("Nothing to fetch");
        return Ok(Some(Vec::new()));
    }

    if !yes && !confirm(&estimate)? {
        ui::dim(&format!("Skipped {root}"));
        return Ok(None);
    }

    let armed = interrupt::arm()?;
    let spinner = WalkSpinner::new("Collecting", ctx.quiet);
    let result = client.collect_with(&root, armed.flag(), &spinner);
    spinner.finish();
    drop(armed);

    cancelled_as_none(result).with_context(|| format!("Could not list {root}"))
}

fn estimate_remote(
    ctx: &Context,
    client: &Client,
    root: &RepositoryLocation,
) -> Result<Option<EnumerationEstimate>> {
    let armed = interrupt::arm()?;
    let spinner = WalkSpinner::new("Estimating", ctx.quiet);
    let result = client.estimate_with(root, armed.flag(), &spinner);
    spinner.finish();
    drop(armed);

    cancelled_as_none(result).with_context(|| format!("Could not estimate {root}"))
}

/// Turn a user abort into `None` after telling the user
fn cancelled_as_none<T>(result: flatkit::Result<T>) -> flatkit::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_aborted() => {
            ui::warn("Repo Download Failed: User Aborted");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn confirm(estimate: &EnumerationEstimate) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Download {} ({})?",
            ui::plural(estimate.file_count, "file"),
            ui::format_size(estimate.total_size)
        ))
        .default(true)
        .interact()
        .context("Failed to read confirmation")
}

fn preview(files: &[FlattenedFile]) {
    ui::header(&format!("Would write {}", ui::plural(files.len() as u64, "file")));
    for file in files {
        ui::mapping(&file.original_path, &file.flattened_name);
    }
}

fn write_archive(
    ctx: &Context,
    client: &Client,
    files: &[FlattenedFile],
    output: &Path,
) -> Result<Assembly> {
    let reporter = AssemblyReporter::new(files.len(), ctx.quiet);
    let assembly = client
        .assemble(files, &reporter)
        .context("Could not build the archive")?;
    assembly
        .save(output, &reporter)
        .with_context(|| format!("Could not save {}", output.display()))?;
    Ok(assembly)
}

fn report(assembly: &Assembly, requested: usize, output: &Path) {
    let size = ui::format_size(assembly.bytes.len() as u64);
    if assembly.is_complete() {
        ui::success(&format!(
            "Wrote {} to {} ({size})",
            ui::plural(assembly.entry_count() as u64, "file"),
            output.display()
        ));
        return;
    }

    ui::warn(&format!(
        "Wrote {} of {requested} files to {} ({size})",
        assembly.entry_count(),
        output.display()
    ));
    for failure in &assembly.failures {
        ui::dim(&format!("{}: {}", failure.original_path, failure.error));
    }
    if let Some(last) = assembly.last_failure() {
        ui::error(&format!("Last failure: {}", last.error));
        ui::dim(last.error.category().advice());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flatkit::{CancelFlag, FileSource, MockBackend};
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    fn mock_client() -> Client {
        Client::with_backend(Box::new(MockBackend::with_sample_tree()))
    }

    #[test]
    fn test_select_remote_with_yes() {
        let client = mock_client();
        let files = select_remote(&quiet(), &client, "https://github.com/octo/hello", true)
            .unwrap()
            .unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.original_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["hello/a.txt", "hello/docs/b.txt", "hello/docs/deep/c.txt"]
        );
    }

    #[test]
    fn test_select_remote_invalid_url() {
        let client = mock_client();
        let err = select_remote(&quiet(), &client, "https://gitlab.com/octo/hello", true)
            .unwrap_err();
        assert!(err.to_string().contains("invalid GitHub URL"));
    }

    #[test]
    fn test_select_remote_missing_tree_is_an_error() {
        let client = Client::with_backend(Box::new(MockBackend::new()));
        assert!(select_remote(&quiet(), &client, "https://github.com/octo/gone", true).is_err());
    }

    #[test]
    fn test_cancelled_as_none() {
        assert_eq!(cancelled_as_none(Ok(3)).unwrap(), Some(3));
        assert_eq!(
            cancelled_as_none::<u8>(Err(flatkit::Error::OperationAborted)).unwrap(),
            None
        );

        let flag = CancelFlag::new();
        flag.cancel();
        let root = location::parse_reference("https://github.com/octo/hello").unwrap();
        let aborted = mock_client().estimate(&root, &flag);
        assert_eq!(cancelled_as_none(aborted).unwrap(), None);

        let failed = cancelled_as_none::<u8>(Err(flatkit::Error::InvalidReference("x".into())));
        assert!(failed.is_err());
    }

    #[test]
    fn test_select_local_files_and_dirs() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("notes");
        fs::create_dir_all(dir.join("inner")).unwrap();
        fs::write(dir.join("inner").join("todo.txt"), "milk").unwrap();
        let single = temp.path().join("single.md");
        fs::write(&single, "# hi").unwrap();

        let files = select_local(&[dir, single]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.original_path.as_str()).collect();
        assert_eq!(paths, vec!["notes/inner/todo.txt", "single.md"]);
    }

    #[test]
    fn test_select_local_missing_path() {
        let temp = TempDir::new().unwrap();
        assert!(select_local(&[temp.path().join("missing")]).is_err());
    }

    #[test]
    fn test_write_archive_mixed_sources() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.zip");

        let client = mock_client();

        let files = vec![
            FlattenedFile {
                original_path: "notes/todo.txt".to_string(),
                flattened_name: "notes))todo.txt".to_string(),
                source: FileSource::Memory(b"milk".to_vec()),
            },
            FlattenedFile {
                original_path: "hello/a.txt".to_string(),
                flattened_name: "hello))a.txt".to_string(),
                source: FileSource::Remote("mock://a.txt".to_string()),
            },
            FlattenedFile {
                original_path: "hello/x.txt".to_string(),
                flattened_name: "hello))x.txt".to_string(),
                source: FileSource::Remote("mock://missing".to_string()),
            },
        ];

        let assembly = write_archive(&quiet(), &client, &files, &output).unwrap();
        assert_eq!(assembly.written, vec!["notes))todo.txt", "hello))a.txt"]);
        assert_eq!(assembly.failures.len(), 1);
        assert_eq!(fs::read(&output).unwrap(), assembly.bytes);

        report(&assembly, files.len(), &output);
    }

    #[test]
    fn test_write_archive_unwritable_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("missing-dir").join("out.zip");
        let files = vec![FlattenedFile {
            original_path: "a.txt".to_string(),
            flattened_name: "a.txt".to_string(),
            source: FileSource::Memory(b"a".to_vec()),
        }];
        assert!(write_archive(&quiet(), &mock_client(), &files, &output).is_err());
    }
}
