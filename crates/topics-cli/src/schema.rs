//! # Schema Subcommand
//!
//! Prints the published JSON Schema for raw topic modules.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use topics_schema::topic_module_schema;

/// Arguments for the `topics schema` subcommand.
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {
    /// Output file. Prints to stdout when omitted.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run_schema(args: &SchemaArgs, repo_root: &Path) -> Result<u8> {
    let mut json = serde_json::to_vec_pretty(&topic_module_schema())
        .context("failed to serialize schema")?;
    json.push(b'\n');
    let out = args.out.as_deref().map(|p| crate::resolve_path(p, repo_root));
    crate::write_output(out.as_deref(), &json)?;
    Ok(0)
}
