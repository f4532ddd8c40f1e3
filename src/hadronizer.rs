//! Interface to a parton generation and hadronization backend
use rand::Rng;
use tracing::debug;

use crate::data::{GenEventInfoProduct, GenLumiInfoHeader, GenRunInfoProduct};
use crate::framework::{Event, LuminosityBlock};
use crate::gen_event::GenEvent;
use crate::pset::{ParameterError, ParameterSet};
use crate::random::{RandomEngine, RandomEngineUser};

/// A generator backend driven by [`crate::GeneratorFilter`]
///
/// Methods returning `bool` report success. The filter treats a failed
/// configuration step as fatal and a failed generation step as "no
/// event produced".
pub trait Hadronizer: RandomEngineUser + Send {
    /// Name used in diagnostics
    fn classname(&self) -> &str;

    /// Names of process-wide resources the backend needs exclusively
    fn shared_resources(&self) -> Vec<String> {
        Vec::new()
    }

    fn read_settings(&mut self, pass: u32) -> bool;

    /// Leave the given species undecayed for an external decayer
    fn declare_stable_particles(&mut self, pdg_ids: &[i32]) -> bool;

    fn declare_special_settings(&mut self, settings: &[String]) -> bool;

    fn initialize_for_internal_partons(&mut self) -> bool;

    /// Framework event the next generation call belongs to
    fn set_edm_event(&mut self, _event: &Event) {}

    /// Choose one of the randomized configurations for a luminosity block
    fn randomize_index(&mut self, _lumi: &LuminosityBlock) {}

    /// Prepare parton-level input for a whole luminosity block
    fn generate_lhe(&mut self, _lumi: &LuminosityBlock, _n_threads: usize) {}

    /// Release whatever [`Hadronizer::generate_lhe`] prepared
    fn clean_lhe(&mut self) {}

    fn generate_partons_and_hadronize(&mut self) -> bool;

    fn decay(&mut self) -> bool;

    /// Hand over the current event
    fn get_gen_event(&mut self) -> Option<Box<GenEvent>>;

    /// Generator-level acceptance
    fn select(&self, _event: &GenEvent) -> bool {
        true
    }

    /// Make `event` the working event again
    fn reset_event(&mut self, event: Box<GenEvent>);

    /// Decay whatever is left unstable after external decays
    fn residual_decay(&mut self) -> bool;

    fn finalize_event(&mut self);

    fn statistics(&mut self);

    /// Event summary, `None` lets the caller derive one from the event
    fn get_gen_event_info(&mut self) -> Option<GenEventInfoProduct> {
        None
    }

    fn get_gen_run_info(&self) -> GenRunInfoProduct;

    fn get_gen_lumi_info_header(&self) -> GenLumiInfoHeader {
        GenLumiInfoHeader::default()
    }
}

/// State shared by most hadronizer implementations
///
/// Holds the working event, the attached random engine and the
/// randomized-configuration bookkeeping.
#[derive(Debug, Default)]
pub struct BaseHadronizer {
    event: Option<Box<GenEvent>>,
    event_info: Option<GenEventInfoProduct>,
    run_info: GenRunInfoProduct,
    engine: Option<RandomEngine>,
    random_weights: Vec<f64>,
    random_index: i32,
}

impl BaseHadronizer {
    /// Reads the optional `RandomizedParameterWeights` vector
    pub fn new(pset: &ParameterSet) -> Result<Self, ParameterError> {
        let random_weights: Vec<f64> = pset.get_vector("RandomizedParameterWeights")?;
        if random_weights.iter().any(|w| *w < 0.) {
            return Err(ParameterError::Conversion {
                name: "RandomizedParameterWeights".to_owned(),
                value: format!("{:?}", random_weights),
            });
        }
        Ok(BaseHadronizer {
            random_weights,
            random_index: -1,
            ..Default::default()
        })
    }

    pub fn engine(&mut self) -> Option<&mut RandomEngine> {
        self.engine.as_mut()
    }

    pub fn take_event(&mut self) -> Option<Box<GenEvent>> {
        self.event.take()
    }

    pub fn reset_event(&mut self, event: Box<GenEvent>) {
        self.event = Some(event);
    }

    pub fn event(&self) -> Option<&GenEvent> {
        self.event.as_deref()
    }

    pub fn event_mut(&mut self) -> Option<&mut GenEvent> {
        self.event.as_deref_mut()
    }

    pub fn take_event_info(&mut self) -> Option<GenEventInfoProduct> {
        self.event_info.take()
    }

    pub fn set_event_info(&mut self, info: GenEventInfoProduct) {
        self.event_info = Some(info);
    }

    pub fn run_info(&self) -> &GenRunInfoProduct {
        &self.run_info
    }

    pub fn run_info_mut(&mut self) -> &mut GenRunInfoProduct {
        &mut self.run_info
    }

    /// Index of the configuration chosen for the current luminosity block
    pub fn random_index(&self) -> i32 {
        self.random_index
    }

    /// Draw a configuration index according to the configured weights
    ///
    /// Without weights, or without an attached engine, the index stays -1.
    pub fn randomize_index(&mut self) {
        if self.random_weights.is_empty() {
            return;
        }
        let total: f64 = self.random_weights.iter().sum();
        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => return,
        };
        let mut roll = engine.gen::<f64>() * total;
        let last = self.random_weights.len() - 1;
        self.random_index = last as i32;
        for (idx, weight) in self.random_weights.iter().enumerate() {
            roll -= weight;
            if roll < 0. {
                self.random_index = idx as i32;
                break;
            }
        }
        debug!(index = self.random_index, "randomized configuration");
    }

    pub fn gen_lumi_info_header(&self, config_description: String) -> GenLumiInfoHeader {
        GenLumiInfoHeader {
            random_config_index: self.random_index,
            config_description,
            ..Default::default()
        }
    }
}

impl RandomEngineUser for BaseHadronizer {
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine> {
        std::mem::replace(&mut self.engine, engine)
    }
}
