use std::path::PathBuf;

use tracing::{error, info};

use vacancy::engine::CapacityPolicy;
use vacancy::limits::{RESERVATION_PAGE_SIZE, ROOM_LOOKUP_BATCH_SIZE};
use vacancy::search::{search, SearchOptions, SearchRequest};
use vacancy::store::{InMemorySource, Snapshot};

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the JSON response
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let snapshot_path =
        PathBuf::from(env_opt("VACANCY_SNAPSHOT").unwrap_or_else(|| "./snapshot.json".into()));
    let page_size: usize = env_opt("VACANCY_PAGE_SIZE")
        .and_then(|s| s.parse().ok())
        .unwrap_or(RESERVATION_PAGE_SIZE);
    let room_batch_size: usize = env_opt("VACANCY_ROOM_BATCH_SIZE")
        .and_then(|s| s.parse().ok())
        .unwrap_or(ROOM_LOOKUP_BATCH_SIZE);
    let capacity_policy: CapacityPolicy = match env_opt("VACANCY_CAPACITY_POLICY") {
        Some(raw) => raw.parse()?,
        None => CapacityPolicy::default(),
    };
    let strict = env_opt("VACANCY_STRICT").is_some_and(|s| s == "1" || s.eq_ignore_ascii_case("true"));

    let request = SearchRequest {
        check_in: env_opt("VACANCY_CHECK_IN"),
        check_out: env_opt("VACANCY_CHECK_OUT"),
        property_type: env_opt("VACANCY_PROPERTY_TYPE"),
        location: env_opt("VACANCY_LOCATION"),
    };
    let options = SearchOptions {
        page_size,
        room_batch_size,
        capacity_policy,
        strict,
    };

    let source = InMemorySource::from_snapshot(Snapshot::load(&snapshot_path)?);
    info!("vacancy search over {}", snapshot_path.display());
    info!("  properties: {}", source.property_count());
    info!("  reservations: {}", source.reservation_count());
    info!("  capacity_policy: {capacity_policy:?}");
    info!("  strict: {strict}");

    let response = match search(&source, &request, &options).await {
        Ok(response) => response,
        Err(e) => {
            error!("search failed: {e}");
            return Err(e.into());
        }
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
