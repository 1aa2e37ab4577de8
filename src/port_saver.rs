use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Orbit, Rocket};
use tokio::sync::watch;

pub fn create_pair() -> (PortSaver, Port) {
    let (tx, rx) = watch::channel(None);
    (PortSaver { sender: tx }, Port { rx })
}

/// The port the server ended up listening on, known once it has lifted off.
pub struct Port {
    rx: watch::Receiver<Option<u16>>,
}

impl Port {
    /// Waits for liftoff. `None` if the server was dropped before binding.
    pub async fn get(&self) -> Option<u16> {
        let mut rx = self.rx.clone();
        loop {
            if let Some(port) = *rx.borrow() {
                return Some(port);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

pub struct PortSaver {
    sender: watch::Sender<Option<u16>>,
}

#[rocket::async_trait]
impl Fairing for PortSaver {
    fn info(&self) -> Info {
        Info {
            name: "Port Saver",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        if self.sender.send(Some(rocket.config().port)).is_err() {
            tracing::warn!("Nobody is waiting for the bound port");
        }
    }
}
