use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::config::ServerConfig;
use crate::queue::SubmissionQueue;
use crate::routes::{get_records_handler, post_pull_request_handler};
use crate::store::VerdictSink;

pub fn build_server(
    config: ServerConfig,
    queue: Arc<SubmissionQueue>,
    store: Arc<dyn VerdictSink>,
) -> std::io::Result<Server> {
    let queue = web::Data::from(queue);
    let store = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(queue.clone())
            .app_data(store.clone())
            .wrap(middleware::Logger::default())
            .service(post_pull_request_handler)
            .service(get_records_handler)
    })
    .bind((
        config.bind_address.unwrap_or("127.0.0.1".to_string()),
        config.bind_port.unwrap_or(8080),
    ))?
    .run();

    Ok(server)
}
