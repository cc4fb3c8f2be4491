use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use prgrader::config::{CliArgs, Config};
use prgrader::grader::Grader;
use prgrader::queue::SubmissionQueue;
use prgrader::store::{SqliteStore, VerdictSink};
use prgrader::web_server::build_server;
use prgrader::worker::worker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let n_workers = cli.workers;

    if n_workers == 0 {
        panic!("The number of grading workers must not be 0");
    }

    let Config {
        server: server_config,
        grader: grader_config,
        users,
    } = cli.to_config().expect("Failed to load configuration");

    let store = SqliteStore::connect(cli.database.as_deref())
        .await
        .expect("Failed to initialize verdict store");

    let store: Arc<dyn VerdictSink> = Arc::new(store);
    let grader = Arc::new(Grader::new(&grader_config));
    let users = Arc::new(users);
    let queue = Arc::new(SubmissionQueue::new());
    let shutdown_token = CancellationToken::new();

    // ======= PREPARATION END, EXECUTION START =======

    let mut workers = JoinSet::new();
    for i in 1..=n_workers {
        workers.spawn(worker(
            i,
            grader.clone(),
            users.clone(),
            store.clone(),
            queue.clone(),
            shutdown_token.clone(),
        ));
    }

    let server = build_server(server_config, queue, store).expect("Failed to build server");

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    // ===== EXECUTION END, WAITING FOR SHUTDOWN ======

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
        Some(res_worker) = workers.join_next() => {
            log::error!("A worker terminated unexpectedly: {:?}", res_worker);
        }
    }

    // 1. Shutdown actix-web server gracefully
    server_handle.stop(true).await;

    // 2. Broadcast shutdown signal to workers
    shutdown_token.cancel();
    log::info!("Shutdown signal sent to workers, waiting for them to finish...");

    // 3. Wait until every worker terminates; any in-flight submission has its
    //    workspace torn down before the pipeline returns
    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            if e.is_panic() {
                log::error!("Worker handle panicked: {:?}", e);
            } else {
                log::error!("Worker handle finished with error: {:?}", e);
            }
        }
    }

    log::info!("Shutdown complete");
    Ok(())
}
