use anyhow::{Context, Result};
use shlink_core::fs::{create_absolute, create_relative};
use std::path::Path;
use tracing::{info, warn};

/// Optional fields applied on top of the filesystem-derived record
#[derive(Debug, Default, Clone)]
pub struct CreateOptions {
    /// Resolve `target` relative to this directory instead of absolutely
    pub base: Option<String>,
    pub arguments: Option<String>,
    pub name: Option<String>,
    pub icon_location: Option<String>,
    pub icon_index: i32,
    pub unicode: bool,
}

pub fn execute(target: &str, output: &str, options: &CreateOptions) -> Result<()> {
    info!("Creating shortcut to {}", target);

    let mut link = match &options.base {
        Some(base) => create_relative(base, target)
            .with_context(|| format!("Failed to build relative link to {}", target))?,
        None => create_absolute(target)
            .with_context(|| format!("Failed to build link to {}", target))?,
    };

    let resolved = match &options.base {
        Some(base) => Path::new(base).join(target),
        None => Path::new(target).to_path_buf(),
    };
    if !resolved.exists() {
        warn!("Target {} does not exist; header metadata left empty", resolved.display());
    }

    link.set_unicode(options.unicode);
    if let Some(arguments) = &options.arguments {
        link.set_arguments(arguments.as_str());
    }
    if let Some(name) = &options.name {
        link.set_name(name.as_str());
    }
    if let Some(icon) = &options.icon_location {
        link.set_icon_location(icon.as_str());
    }
    link.header_mut().icon_index = options.icon_index;

    link.save(output)
        .with_context(|| format!("Failed to write shortcut: {}", output))?;

    info!(
        "Wrote {} (flags 0x{:08X})",
        output,
        link.header().link_flags().as_u32()
    );

    Ok(())
}
