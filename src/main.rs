use exacttarget_mailer::configuration::get_configuration;
use exacttarget_mailer::service::ExactTargetService;
use exacttarget_mailer::startup::Application;
use exacttarget_mailer::telemetry::{get_subscriber, init_subscriber};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("exacttarget_mailer".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration()?;
    let service = ExactTargetService::from_settings(&configuration);
    let application = Application::build(&configuration, service).await?;
    application.server.launch().await?;
    Ok(())
}
