use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::{config::BoothConfig, filters::FilterSelection};

/// The user's current filter and mirror choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoothSettings {
    pub filter: FilterSelection,
    pub flip: bool,
}

/// Writer side of the shared booth settings
///
/// The render loop and capture sequencer each hold a receiver from
/// [`SettingsHandle::subscribe`] and read the current value at every frame or
/// shot. Only explicit user actions go through this handle.
#[derive(Debug)]
pub struct SettingsHandle {
    tx: watch::Sender<BoothSettings>,
}

impl SettingsHandle {
    pub fn new(initial: BoothSettings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn from_config(config: &BoothConfig) -> Self {
        Self::new(BoothSettings {
            filter: config.filter,
            flip: config.flip,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<BoothSettings> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> BoothSettings {
        *self.tx.borrow()
    }

    pub fn select_filter(&self, filter: FilterSelection) {
        self.tx.send_modify(|settings| settings.filter = filter);
        info!("Filter changed to: {}", filter);
    }

    pub fn set_flip(&self, flip: bool) {
        self.tx.send_modify(|settings| settings.flip = flip);
        info!("Flip toggle set to: {}", flip);
    }

    /// Invert the flip flag, returning the new value
    pub fn toggle_flip(&self) -> bool {
        let flip = !self.current().flip;
        self.set_flip(flip);
        flip
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(BoothSettings::default())
    }
}
