use anyhow::{Context, Result};
use tagfix_core::source::{resolve_segment, SegmentSelector, SegmentSource};

use crate::commands::open_context;

/// List segments, or resolve a single one from a selector string.
pub fn segments_command(root: &str, select: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;

    let segments = match select {
        Some(text) => {
            let selector: SegmentSelector = text.parse()?;
            vec![resolve_segment(&ctx.snapshot, &selector)
                .with_context(|| format!("Failed to select segment '{text}'"))?]
        }
        None => ctx.snapshot.segments(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    println!("Segments:");
    if segments.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for segment in segments {
        println!("- #{} {}", segment.handle.0, segment);
    }
    Ok(())
}
