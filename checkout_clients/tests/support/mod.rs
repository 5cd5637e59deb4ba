use actix_web::{web::ServiceConfig, App, HttpServer};

/// Starts an in-process HTTP server on a random local port and returns its base URL.
pub async fn mock_server(configure: fn(&mut ServiceConfig)) -> String {
    let _ = env_logger::try_init();
    let server = HttpServer::new(move || App::new().configure(configure))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("Could not bind mock server");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}
