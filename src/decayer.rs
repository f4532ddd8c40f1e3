//! Interface to an external decay package
use crate::error::Result;
use crate::framework::EventSetup;
use crate::gen_event::GenEvent;
use crate::random::RandomEngineUser;

/// Secondary decays applied to already hadronized events
///
/// The hadronizer is told to keep the species returned by
/// [`Decayer::operates_on_particles`] stable, so that this package can
/// decay them.
pub trait Decayer: RandomEngineUser + Send {
    fn classname(&self) -> &str;

    fn init(&mut self, setup: &EventSetup) -> Result<()>;

    /// PDG IDs of the species this package decays
    fn operates_on_particles(&self) -> Vec<i32>;

    /// Settings the hadronizer has to apply for this package
    fn special_settings(&self) -> Vec<String> {
        Vec::new()
    }

    /// Decay the particles of `event`
    ///
    /// Returns the event to continue with: either `event` itself or a
    /// replacement. `None` means nothing is left of the event.
    fn decay(&mut self, event: Box<GenEvent>) -> Option<Box<GenEvent>>;

    fn statistics(&mut self) {}

    fn shared_resources(&self) -> Vec<String> {
        Vec::new()
    }
}
