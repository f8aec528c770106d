use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use xsite_state_transfer::config::{CacheConfiguration, NodeConfig};
use xsite_state_transfer::container::memory::InMemoryDataContainer;
use xsite_state_transfer::container::store::InMemoryCacheStore;
use xsite_state_transfer::statetransfer::command::{
    CommandContext, ReplicableCommand, StateRequestType, XSiteStateRequestCommand,
};
use xsite_state_transfer::statetransfer::handlers::{
    handle_cancel_transfer, handle_push, handle_state_request, handle_transfer_status,
};
use xsite_state_transfer::statetransfer::provider::{CacheComponents, XSiteStateProvider};
use xsite_state_transfer::topology::hash::ModuloConsistentHash;
use xsite_state_transfer::topology::manager::LocalTopologyManager;
use xsite_state_transfer::topology::types::{Address, CacheTopology};
use xsite_state_transfer::transaction::table::InMemoryTransactionTable;
use xsite_state_transfer::transport::http::{HttpBackupTransport, send_state_request};
use xsite_state_transfer::transport::protocol::{
    ENDPOINT_STATE_REQUEST, ENDPOINT_XSITE_CANCEL, ENDPOINT_XSITE_PUSH, ENDPOINT_XSITE_STATUS,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--config <file.json>] [--resync <cache>/<site>]",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:7000", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:7000 --config node-a.json --resync orders/siteB",
            args[0]
        );

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut config_path: Option<String> = None;
    let mut resync: Vec<(String, String)> = vec![];

    let mut i = 1;
    while i + 1 < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--config" => {
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--resync" => {
                match args[i + 1].split_once('/') {
                    Some((cache, site)) => resync.push((cache.to_string(), site.to_string())),
                    None => anyhow::bail!("--resync expects <cache>/<site>, got {}", args[i + 1]),
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.ok_or_else(|| anyhow::anyhow!("--bind is required"))?;

    // 1. Configuration:
    let config = match &config_path {
        Some(path) => NodeConfig::from_json_file(path)?,
        None => NodeConfig::default(),
    };
    let caches = if config.caches.is_empty() {
        vec![CacheConfiguration::new("default")]
    } else {
        config.caches.clone()
    };

    tracing::info!(
        "Starting node {} (site {}) with {} cache(s) and {} remote site(s)",
        bind_addr,
        config.local_site.as_deref().unwrap_or("<unnamed>"),
        caches.len(),
        config.sites.len()
    );

    // 2. Shared components:
    let local_address = Address::named(&bind_addr.to_string());
    let topology_manager = Arc::new(LocalTopologyManager::new());
    let transport = Arc::new(HttpBackupTransport::new(config.sites.clone()));
    let ctx = CommandContext::new();

    // 3. One provider per cache:
    for cache in caches {
        let ch = ModuloConsistentHash::new(cache.num_segments, 1, vec![local_address.clone()]);
        topology_manager.install(&cache.name, CacheTopology::new(1, Arc::new(ch)));

        let components = CacheComponents {
            topology_manager: topology_manager.clone(),
            transaction_table: Arc::new(InMemoryTransactionTable::new()),
            container: Arc::new(InMemoryDataContainer::new()),
            store: Some(Arc::new(InMemoryCacheStore::new())),
            transport: transport.clone(),
            executor: tokio::runtime::Handle::current(),
        };

        let provider = XSiteStateProvider::new(
            local_address.clone(),
            config.local_site.clone(),
            cache,
            components,
        );
        ctx.register(provider);
    }

    // 4. HTTP Router:
    let cancel_route = format!("{}/:site", ENDPOINT_XSITE_CANCEL);
    let app = Router::new()
        .route(ENDPOINT_STATE_REQUEST, post(handle_state_request))
        .route(ENDPOINT_XSITE_STATUS, get(handle_transfer_status))
        .route(&cancel_route, post(handle_cancel_transfer))
        .route(ENDPOINT_XSITE_PUSH, post(handle_push))
        .layer(Extension(ctx.clone()));

    // 5. Spawn transfer reporter:
    let stats_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;
            for provider in stats_ctx.providers() {
                for transfer in provider.transfers() {
                    tracing::info!(
                        "  - cache={} site={} status={:?} chunks={} entries={}",
                        transfer.cache_name,
                        transfer.site,
                        transfer.status,
                        transfer.chunks_sent,
                        transfer.entries_sent
                    );
                }
            }
        }
    });

    // 6. Issue requested resyncs through this node's own endpoint:
    for (cache, site) in resync {
        let origin = local_address.clone();
        let requesting_site = config.local_site.clone().unwrap_or_default();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let command = ReplicableCommand::XSiteStateRequest(XSiteStateRequestCommand::new(
                &requesting_site,
                &site,
                &cache,
                origin,
                StateRequestType::StartXSiteStateTransfer,
            ));
            let client = reqwest::Client::new();
            match send_state_request(&client, bind_addr, &command, Duration::from_secs(10)).await {
                Ok(reply) if reply.success => {
                    tracing::info!("Resync of cache {} to site {} started", cache, site)
                }
                Ok(reply) => tracing::warn!(
                    "Resync of cache {} to site {} rejected: {}",
                    cache,
                    site,
                    reply.error.unwrap_or_default()
                ),
                Err(e) => tracing::error!("Resync request for cache {} failed: {}", cache, e),
            }
        });
    }

    // 7. Start HTTP server:
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
