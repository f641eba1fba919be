mod cli;
mod error;

use crate::cli::{BatchArgs, Cli, Command, LinkArgs, PreviewArgs, RunArgs};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use hardbound_config::Config;
use hardbound_library::Resolver;
use hardbound_library::audit::{AuditRecord, AuditStatus};
use hardbound_library::batch::{BatchEvent, BatchItem, BatchReport, Context, ItemReport, Mode, stream};
use hardbound_library::read_manifest;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("hardbound: {err:?}");
            ExitCode::from(2)
        },
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// `Ok(false)` when at least one item failed.
async fn run(cli: Cli) -> Result<bool> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Link(LinkArgs { sources, dst, ext, cap, run }) => {
            override_cap(&mut config, cap)?;
            let items = sources.into_iter().map(|source| BatchItem::new(source, dst.clone())).collect();
            materialize(&config, items, &run, ext).await
        },
        Command::Batch(BatchArgs { manifest, run }) => {
            let items = read_manifest(&manifest).or_raise(|| ErrorKind::Manifest)?;
            materialize(&config, items, &run, None).await
        },
        Command::Preview(args) => {
            override_cap(&mut config, args.cap)?;
            Ok(preview(&config, &args))
        },
    }
}

fn override_cap(config: &mut Config, cap: Option<usize>) -> Result<()> {
    if let Some(cap) = cap {
        config.naming.path_cap = cap;
        config.validate().or_raise(|| ErrorKind::Config)?;
    }
    Ok(())
}

async fn materialize(config: &Config, items: Vec<BatchItem>, args: &RunArgs, extension: Option<String>) -> Result<bool> {
    let mode = match args.dry_run {
        true => Mode::DryRun,
        false => Mode::Commit,
    };
    let ctx = Arc::new(Context::from_config(config, mode, args.force).with_extension(extension));
    let mut audit = args.audit.as_deref().map(AuditLog::open).transpose()?;
    let cap = config.naming.path_cap;

    let mut events = std::pin::pin!(stream(ctx, items, config.batch.concurrency));
    let mut report = BatchReport::default();
    while let Some(event) = events.next().await {
        match event {
            BatchEvent::DiscoveryComplete(total) => tracing::info!(total, ?mode, "Processing items"),
            BatchEvent::Processed(item) => {
                let record = AuditRecord::now(&item, cap);
                print_item(&item, &record);
                if let Some(audit) = audit.as_mut() {
                    audit.write(&record)?;
                }
                report.push(*item);
            },
            BatchEvent::Started | BatchEvent::Complete => {},
        }
    }
    if let Some(audit) = audit {
        audit.finish()?;
    }

    println!(
        "{} succeeded, {} already linked, {} failed",
        report.succeeded, report.skipped, report.failed
    );
    Ok(!report.has_failures())
}

fn print_item(item: &ItemReport, record: &AuditRecord) {
    match &item.result {
        Ok(outcome) => {
            let destination = outcome.resolution.destination.file_path();
            println!("{:<14} {}", record.status.as_str(), destination.display());
        },
        Err(failure) => println!(
            "{:<14} {}: {} ({})",
            AuditStatus::Failed.as_str(),
            failure.source.display(),
            failure.message,
            failure.kind
        ),
    }
}

/// Prints how `name` parses and shortens. Returns whether it resolved.
fn preview(config: &Config, args: &PreviewArgs) -> bool {
    let resolver = Resolver::from_config(&config.naming);
    let extension = match &args.ext {
        Some(ext) => format!(".{}", ext.trim().trim_start_matches('.')),
        None => config.naming.fallback_ext.clone(),
    };
    let resolution = match resolver.resolve_name(&args.name, Path::new(""), &extension) {
        Ok(resolution) => resolution,
        Err(err) => {
            println!("{}: {}", err.code(), *err);
            return false;
        },
    };

    let tokens = &resolution.tokens;
    println!("identifier  {}", tokens.identifier());
    println!("title       {}", tokens.title());
    println!("volume      {}", tokens.volume());
    for (label, value) in [
        ("subtitle", tokens.subtitle()),
        ("year", tokens.year()),
        ("author", tokens.author()),
        ("tag", tokens.tag()),
    ] {
        if let Some(value) = value {
            println!("{label:<11} {value}");
        }
    }
    println!("folder      {}", resolution.destination.folder);
    println!("file        {}", resolution.destination.file);
    println!("length      {}/{}", resolution.length, resolver.budget().cap);
    if !resolution.steps.is_empty() {
        let steps: Vec<String> = resolution.steps.iter().map(ToString::to_string).collect();
        println!("trimmed     {}", steps.join(", "));
    }
    true
}

/// JSON-lines audit output, appended to.
struct AuditLog {
    path: PathBuf,
    writer: BufWriter<File>,
}
impl AuditLog {
    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .or_raise(|| ErrorKind::Audit(path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, record: &AuditRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).or_raise(|| ErrorKind::Audit(self.path.clone()))?;
        self.writer.write_all(b"\n").or_raise(|| ErrorKind::Audit(self.path.clone()))
    }

    fn finish(mut self) -> Result<()> {
        self.writer.flush().or_raise(|| ErrorKind::Audit(self.path.clone()))
    }
}
