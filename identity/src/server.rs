use std::net::SocketAddr;
use std::sync::Arc;

use hyper::Method;
use jsonrpsee::server::{AllowHosts, ServerBuilder};
use jsonrpsee::RpcModule;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::context::IdentityContext;
use crate::rpc;

pub async fn run_server(context: IdentityContext) -> anyhow::Result<()> {
    let port = context.config.port;
    let cors = CorsLayer::new()
        .allow_methods([Method::POST])
        .allow_origin(Any)
        .allow_headers([hyper::header::CONTENT_TYPE]);
    let middleware = ServiceBuilder::new().layer(cors);

    let host = format!("0.0.0.0:{port}");
    let server = ServerBuilder::default()
        .set_host_filtering(AllowHosts::Any)
        .set_middleware(middleware)
        .build(host.parse::<SocketAddr>()?)
        .await?;

    let mut module = RpcModule::new(Arc::new(context));
    module.register_async_method("register_player", rpc::register_player)?;
    module.register_async_method("get_player", rpc::get_player)?;
    module.register_async_method("login", rpc::login)?;
    module.register_async_method("refresh_token", rpc::refresh_token)?;
    module.register_async_method("token_public_keys", rpc::token_public_keys)?;
    module.register_async_method("rotate_signing_key", rpc::rotate_signing_key)?;

    let handle = server.start(module)?;
    info!(%host, "identity service listening");
    handle.stopped().await;
    Ok(())
}
