mod error;
mod event;
mod job_schedulers;
mod notification;
mod shared;
mod status;
mod user;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use planner_infra::PlannerContext;
use std::{net::TcpListener, sync::Arc};
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use job_schedulers::{
    IRecipientLookup, ReminderSweeper, ReminderSweeperConfig, ReminderSweeperHandle, SweepReport,
    UserRecipientLookup,
};

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    event::configure_routes(cfg);
    notification::configure_routes(cfg);
    status::configure_routes(cfg);
    user::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    reminder_sweeper: ReminderSweeperHandle,
}

impl Application {
    pub async fn new(context: PlannerContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;
        let reminder_sweeper = Application::start_job_schedulers(&context);

        Ok(Self {
            server,
            port,
            reminder_sweeper,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_job_schedulers(context: &PlannerContext) -> ReminderSweeperHandle {
        Arc::new(ReminderSweeper::from_context(context)).start()
    }

    async fn configure_server(context: PlannerContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    /// Serves requests until the server is shut down, then stops the job schedulers
    pub async fn start(self) -> Result<(), std::io::Error> {
        let res = self.server.await;
        info!("Server stopped, stopping job schedulers");
        self.reminder_sweeper.stop().await;
        res
    }
}
