use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use social_graph_service::api;
use social_graph_service::config::Config;
use social_graph_service::db::create_pool;
use social_graph_service::services::Services;
use social_graph_service::store::{EntityStore, SeaOrmStore};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );
    let pool = create_pool(&config).await?;
    log::info!("Database connection established, schema ready");

    let store: Arc<dyn EntityStore> = Arc::new(SeaOrmStore::new(pool, config.store_timeout()));
    let services = Services::new(store, &config);

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(api::configure(services.clone()))
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await?;

    Ok(())
}
