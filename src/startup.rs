use crate::catchers::*;
use crate::configuration::Settings;
use crate::port_saver;
use crate::port_saver::Port;
use crate::routes::*;
use crate::service::ExactTargetService;
use rocket::{Config, Ignite, Rocket};

pub struct Application {
    pub server: Rocket<Ignite>,
    pub port: Port,
}

impl Application {
    /// Ignites the HTTP surface around `service`.
    ///
    /// A missing `application.port` binds a random free port, which is then
    /// reported through [`Application::port`].
    pub async fn build(
        configuration: &Settings,
        service: ExactTargetService,
    ) -> Result<Application, rocket::Error> {
        let (port_saver, port) = port_saver::create_pair();
        let server = rocket::custom(Config {
            address: configuration.application.host,
            port: configuration.application.port.unwrap_or(0),
            ..Config::debug_default()
        })
        .attach(port_saver)
        .manage(service)
        .manage(configuration.application.clone())
        .mount("/", routes![health_check, send_email])
        .register(
            "/",
            catchers![
                unprocessable_entity_to_bad_request,
                unauthorized_request_credentials
            ],
        )
        .ignite()
        .await?;
        Ok(Application { server, port })
    }
}
