//! `lifechat advice`: guidance for a period.

use lifechat_agent::build_services;

use super::RangeArgs;

pub async fn run(range: RangeArgs, motivational: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    super::require_api_key(&config)?;
    let (start, end) = range.resolve(&config)?;
    let services = build_services(&config).await?;

    let text = if motivational {
        services.advisor.motivational_speech(start, end).await?
    } else {
        services.advisor.advice(start, end).await?
    };
    println!("{text}");
    Ok(())
}
