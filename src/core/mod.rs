pub mod cycle;
pub mod doctor;
pub mod ent;
pub mod notifier;
pub mod presenter;
pub mod probe;
pub mod state;

pub use cycle::{run_cycle, run_shutdown_cycle, Context};
pub use doctor::Doctor;
pub use ent::*;
pub use notifier::{ChatClient, DiscordClient, Notifier};
pub use probe::{Probe, ProbeTarget};
