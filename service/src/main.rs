use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::Router;
use service::routes;
use service::state::ServiceCollection;
use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt().json().finish();
    tracing::subscriber::set_global_default(subscriber).expect("Could not init tracing.");

    let nats_uri = get_nats();
    let services = ServiceCollection::build(&nats_uri).await.unwrap();

    let app = Router::new()
        .merge(routes::root::create_route())
        .merge(routes::tasks::create_route(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(|_| async { StatusCode::REQUEST_TIMEOUT }))
                .layer(TimeoutLayer::new(Duration::from_secs(59))),
        );

    let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 0)), get_port());
    info!("listening on {}", &addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await.unwrap();
}

fn get_nats() -> String {
    env::var("NATS_URI").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn get_port() -> u16 {
    let port = env::var("PORT").map(|port| port.parse::<u16>());

    match port {
        Ok(Ok(port)) => port,
        _ => 8000,
    }
}
