use anyhow::{Context, Result};
use shlink_core::Identifier;
use tracing::debug;

pub fn execute(value: &str, strict: bool) -> Result<()> {
    debug!("Decoding identifier: {}", value);

    let id = if strict {
        Identifier::try_parse(value).with_context(|| format!("Invalid identifier: {}", value))?
    } else {
        Identifier::parse(value)
    };

    println!("{}", id);
    Ok(())
}
