//! Command-line host for the zipitem library.
//!
//! Reads files from disk into items, runs the compress or decompress
//! operation through [`ZipPlugin`], and writes the resulting items back.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing_subscriber::EnvFilter;

use zipitem::cli::{Command, CompressArgs, DecompressArgs};
use zipitem::item::{META_COMPRESSED_SIZE, META_UNCOMPRESSED_SIZE};
use zipitem::{CancellationToken, Cli, Item, Output, Request, ZipPlugin};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let plugin = ZipPlugin::new();
    plugin.initialize()?;
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Compress(args) => compress(&plugin, &cancel, &args).await,
        Command::Decompress(args) => decompress(&plugin, &cancel, &args).await,
    }
}

async fn compress(
    plugin: &ZipPlugin,
    cancel: &CancellationToken,
    args: &CompressArgs,
) -> Result<()> {
    let mut items = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let data = fs::read(file)
            .await
            .with_context(|| format!("Cannot read `{}`", file))?;
        if data.is_empty() && !args.quiet {
            eprintln!("Skipping: {} (empty file)", file);
        }
        items.push(Item::from_bytes(args.entry_id(file), data));
    }

    let mut request = Request::new("compress", items);
    request.options.file_name = args.name.clone();

    let Output::Item(archive) = plugin.execute(request, cancel).await? else {
        bail!("compress did not return an archive item");
    };
    let output_path = PathBuf::from(&args.output_dir).join(archive.id());

    fs::create_dir_all(&args.output_dir).await?;
    fs::write(&output_path, archive.raw_bytes().unwrap_or_default())
        .await
        .with_context(|| format!("Cannot write `{}`", output_path.display()))?;

    if !args.quiet {
        println!("  created: {}", output_path.display());
    }
    Ok(())
}

async fn decompress(
    plugin: &ZipPlugin,
    cancel: &CancellationToken,
    args: &DecompressArgs,
) -> Result<()> {
    let data = fs::read(&args.archive)
        .await
        .with_context(|| format!("Cannot read `{}`", args.archive))?;
    let name = Path::new(&args.archive)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| args.archive.clone());

    let items = plugin
        .execute(Request::new("decompress", Item::from_bytes(name, data)), cancel)
        .await?
        .into_items();

    if args.list || args.verbose {
        list_items(&items, args.verbose);
        return Ok(());
    }

    for item in &items {
        extract_item(item, args).await?;
    }
    Ok(())
}

/// List unpacked items, optionally as a size table.
fn list_items(items: &[Item], verbose: bool) {
    if !verbose {
        for item in items {
            println!("{}", item.id());
        }
        return;
    }

    println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Size", "Cmpr");
    println!("{}", "-".repeat(50));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;

    for item in items {
        let uncompressed = size_of(item, META_UNCOMPRESSED_SIZE);
        let compressed = size_of(item, META_COMPRESSED_SIZE);
        println!(
            "{:>10}  {:>10}  {}  {}",
            uncompressed,
            compressed,
            ratio(compressed, uncompressed),
            item.id()
        );
        total_uncompressed += uncompressed;
        total_compressed += compressed;
    }

    println!("{}", "-".repeat(50));
    println!(
        "{:>10}  {:>10}  {}  {} files ({})",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        items.len(),
        format_size(total_uncompressed)
    );
}

/// Write one item under the extraction directory.
async fn extract_item(item: &Item, args: &DecompressArgs) -> Result<()> {
    let relative = safe_relative_path(item.id())?;
    let output_path = PathBuf::from(&args.extract_dir).join(relative);

    if fs::try_exists(&output_path).await? && (args.never_overwrite || !args.overwrite) {
        if !args.quiet {
            eprintln!("Skipping: {} (file exists, use -o to overwrite)", item.id());
        }
        return Ok(());
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    if !args.quiet {
        println!("  extracting: {}", item.id());
    }
    fs::write(&output_path, item.raw_bytes().unwrap_or_default())
        .await
        .with_context(|| format!("Cannot write `{}`", output_path.display()))?;
    Ok(())
}

/// Entry path as a relative path that cannot escape the extraction directory.
fn safe_relative_path(id: &str) -> Result<PathBuf> {
    let path = Path::new(id);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => bail!("Refusing to extract `{}` outside the target directory", id),
        }
    }
    if out.as_os_str().is_empty() {
        bail!("Refusing to extract entry with empty path");
    }
    Ok(out)
}

fn size_of(item: &Item, key: &str) -> u64 {
    item.metadata_value(key)
        .and_then(|v| v.as_size())
        .unwrap_or_default()
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
