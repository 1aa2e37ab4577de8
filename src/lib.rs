#[macro_use]
extern crate rocket;

pub mod catchers;
pub mod configuration;
pub mod domain;
pub mod fuel;
pub mod guards;
pub mod port_saver;
pub mod routes;
pub mod service;
pub mod startup;
pub mod telemetry;

pub use port_saver::Port;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
