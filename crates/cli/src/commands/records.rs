//! `lifechat events` / `lifechat feelings`: query the journal.

use lifechat_agent::open_store;

use super::RangeArgs;

pub async fn events(range: RangeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let (start, end) = range.resolve(&config)?;
    let store = open_store(&config).await?;
    let events = store.events_between(start, end).await?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

pub async fn feelings(range: RangeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let (start, end) = range.resolve(&config)?;
    let store = open_store(&config).await?;
    let feelings = store.feelings_between(start, end).await?;
    println!("{}", serde_json::to_string_pretty(&feelings)?);
    Ok(())
}
