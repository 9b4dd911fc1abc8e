//! Archive command implementation: build without uploading.

use crate::cli::ArchiveArgs;
use crate::error::with_cli_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use offsite_core::archive::ArchiveRequest;
use offsite_core::archive::build_archive;
use std::env;

pub fn execute(args: &ArchiveArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let dest_dir = args
        .dest_dir
        .clone()
        .unwrap_or_else(env::temp_dir);

    let request = ArchiveRequest {
        source_dir: args.source.clone(),
        dest_dir,
        name_prefix: args.prefix.clone(),
    };

    let outcome = with_cli_context(build_archive(&request))?;
    formatter.format_archive_result(&outcome.archive_path, &outcome.report)?;

    Ok(())
}
