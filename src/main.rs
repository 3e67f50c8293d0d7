use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use synaps_match::config::{LogFormat, LoggingSettings, MatchingSettings, Settings};
use synaps_match::core::{CandidatePoolPolicy, Matcher};
use synaps_match::models::Profile;
use synaps_match::routes::{
    self,
    errors::{handle_json_payload_error, handle_query_payload_error},
    AppState, MatchLimits,
};
use synaps_match::services::{CacheManager, ConversationStore, ProfileStoreClient, TokenVerifier};

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level when both are set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

/// Seed profiles used to top up small candidate pools
fn load_seed_profiles(matching: &MatchingSettings) -> std::io::Result<Vec<Profile>> {
    let path = match (&matching.seed_profiles_path, matching.min_candidate_pool) {
        (Some(path), min) if min > 0 => path,
        _ => return Ok(Vec::new()),
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| startup_error(&format!("Failed to read seed profiles from {}", path), e))?;
    let seeds: Vec<Profile> = serde_json::from_str(&raw)
        .map_err(|e| startup_error(&format!("Failed to parse seed profiles in {}", path), e))?;

    Ok(seeds)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    // Logging needs the settings, so a broken config is reported with defaults
    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting Synaps matching service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let store = Arc::new(
        ProfileStoreClient::new(
            settings.store.url.clone(),
            settings.store.service_key.clone(),
            settings.store.profiles_table.clone(),
            settings.store.timeout_secs,
        )
        .map_err(|e| startup_error("Failed to build profile store client", e))?,
    );

    info!("Profile store client initialized (table: {})", settings.store.profiles_table);

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match CacheManager::new(settings.cache.redis_url.as_deref(), l1_cache_size, cache_ttl).await {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to connect to Redis ({}), falling back to in-memory cache", e);
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };
    info!(
        "Cache manager initialized (L1: {} entries, TTL: {}s, redis: {})",
        l1_cache_size,
        cache_ttl,
        cache.has_l2()
    );
    let cache = Arc::new(cache);

    let conversations = Arc::new(
        ConversationStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("Conversation store initialized");

    let auth = Arc::new(TokenVerifier::new(&settings.auth.jwt_secret, &settings.auth.audience));

    let seeds = load_seed_profiles(&settings.matching)?;
    let rules = settings.scoring.rules();
    let matcher = Matcher::new(rules).with_pool_policy(CandidatePoolPolicy::new(
        settings.matching.min_candidate_pool,
        seeds,
    ));

    info!(
        "Matcher initialized (policy: {:?}, min pool: {})",
        rules.policy, settings.matching.min_candidate_pool
    );

    let app_state = AppState {
        store,
        cache,
        conversations,
        auth,
        matcher,
        limits: MatchLimits {
            default_limit: settings.matching.default_limit,
            max_limit: settings.matching.max_limit,
            candidate_fetch_limit: settings.matching.candidate_fetch_limit,
        },
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
