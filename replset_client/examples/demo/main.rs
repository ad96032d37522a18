use replset_client::{ManagementClientBuilder, TopologyDescriptor};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

const SHARD03: &str = r#"{
    "identifier": "rs-shard-03",
    "version": 1,
    "members": [
        { "id": 0, "host": "shard03-a:27017" },
        { "id": 1, "host": "shard03-b:27017" },
        { "id": 2, "host": "shard03-c:27017" }
    ],
    "settings": {
        "defaultWriteConcern": { "w": "majority", "wtimeout": 5000 }
    }
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let endpoint: String =
        std::env::var("REPLSET_ENDPOINT").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let descriptor = TopologyDescriptor::from_json(SHARD03)?;
    descriptor.validate()?;
    tracing::debug!("Descriptor validated: {:?}", &descriptor);

    let client = ManagementClientBuilder::new()
        .set_url(endpoint.as_str())
        .build()?;

    match client.submit_topology(&descriptor).await {
        Ok(ack) => {
            println!("{:#?}", ack);
        }
        Err(e) => {
            tracing::error!("Error happened: {}", &e);
            return Err(e.into());
        }
    };

    Ok(())
}

fn setup_tracing() {
    // Redirect all `log`'s events to the subscriber
    LogTracer::init().expect("Failed to set logger");
    // Set up tracing
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("replset_client-demo".into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    set_global_default(subscriber).expect("Failed to set subscriber");
}
