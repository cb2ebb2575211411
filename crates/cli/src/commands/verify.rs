use std::io;

use anyhow::{anyhow, Result};
use tagfix_core::source::TagSource;

use crate::commands::{open_context, parse_address_arg};

/// Check that every contents cache is keyed by a live function.
pub fn verify_index_command(root: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut stderr = io::stderr();
    let ok = ctx.session(&mut stderr).verify_index()?;

    if !ok {
        return Err(anyhow!("Index verification failed"));
    }
    println!("Index OK");
    Ok(())
}

/// Verify the contents cache of one function, or of every function when none is given.
pub fn verify_content_command(root: &str, function: Option<&str>) -> Result<()> {
    let mut ctx = open_context(root)?;
    let targets = match function {
        Some(text) => vec![parse_address_arg(text)?],
        None => ctx.snapshot.functions(),
    };

    let mut stderr = io::stderr();
    let mut session = ctx.session(&mut stderr);
    let mut failed = Vec::new();
    for ea in &targets {
        let ok = session.verify_content(*ea)?;
        println!("- {:#x}: {}", ea, if ok { "OK" } else { "FAILED" });
        if !ok {
            failed.push(*ea);
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!(
            "Content verification failed for {} of {} function(s)",
            failed.len(),
            targets.len()
        ));
    }
    println!("Verified {} function cache(s)", targets.len());
    Ok(())
}
