//! Key command implementation: show what the operator must authorize.

use crate::cli::KeyArgs;
use crate::error::with_cli_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use offsite_core::keys;

pub fn execute(args: &KeyArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let key = with_cli_context(keys::load_signing_key(args.key_path.as_deref()))?;
    let line = with_cli_context(keys::authorized_key_line(&key))?;
    formatter.format_key_info(&keys::key_fingerprint(&key), Some(&line))?;
    Ok(())
}
