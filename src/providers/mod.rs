//! DNS provider clients.

mod gandi;


pub use gandi::{CreateOutcome, GandiClient};
