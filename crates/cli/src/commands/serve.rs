//! `lifechat serve`: Start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    super::require_api_key(&config)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("LifeChat API");
    println!("  Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("  Provider:  {} ({})", config.provider, config.model);
    println!("  Timezone:  {}", config.timezone);

    lifechat_gateway::start(config).await
}
