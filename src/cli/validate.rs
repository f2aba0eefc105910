use std::path::Path;

use crate::cli::commands::ValidateArgs;
use crate::config::parse_config;
use crate::errors::PentoscanError;
use crate::templates::load_template;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), PentoscanError> {
    let path = Path::new(&args.file);
    if args.config {
        parse_config(path).await?;
        println!("Configuration is valid: {}", args.file);
        return Ok(());
    }

    let template = load_template(path)?;
    println!(
        "Template is valid: {} ({} steps, {} requests{})",
        template.id,
        template.steps.len(),
        template.request_count(),
        if template.script.is_some() { ", script" } else { "" }
    );
    Ok(())
}
