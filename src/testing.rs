//! Backends following a fixed script, for exercising the filter
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::data::{GenEventInfoProduct, GenLumiInfoHeader, GenRunInfoProduct, XSec};
use crate::decayer::Decayer;
use crate::error::{Error, Result};
use crate::framework::{Event, EventSetup, LuminosityBlock};
use crate::gen_event::{GenEvent, GenParticle};
use crate::hadronizer::Hadronizer;
use crate::random::{RandomEngine, RandomEngineUser};
use crate::status;

/// What the scripted backends were asked to do
#[derive(Debug, Default)]
pub struct Record {
    pub calls: Vec<&'static str>,
    /// Whether an engine was attached, one entry per generation attempt
    pub engine_attached: Vec<bool>,
    pub stable_particles: Vec<i32>,
    pub special_settings: Vec<String>,
    /// Outcomes for successive `select` calls, `true` once exhausted
    pub selections: VecDeque<bool>,
    /// Scale of every event handed to the decayer
    pub decayed: Vec<f64>,
    pub statistics: u32,
}

impl Record {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

pub type Recorder = Arc<Mutex<Record>>;

#[derive(Debug, Default)]
pub struct ScriptedHadronizer {
    pub record: Recorder,
    /// Step that reports failure
    pub fail: Option<&'static str>,
    pub resources: Vec<String>,
    /// Whether the hadronizer supplies its own event summary
    pub provides_info: bool,
    engine: Option<RandomEngine>,
    event: Option<Box<GenEvent>>,
    attempts: u32,
}

impl ScriptedHadronizer {
    pub fn new(record: &Recorder) -> Self {
        ScriptedHadronizer {
            record: Arc::clone(record),
            ..Default::default()
        }
    }

    fn step(&self, call: &'static str) -> bool {
        self.record.lock().calls.push(call);
        self.fail != Some(call)
    }
}

impl RandomEngineUser for ScriptedHadronizer {
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine> {
        std::mem::replace(&mut self.engine, engine)
    }
}

impl Hadronizer for ScriptedHadronizer {
    fn classname(&self) -> &str {
        "ScriptedHadronizer"
    }

    fn shared_resources(&self) -> Vec<String> {
        self.resources.clone()
    }

    fn read_settings(&mut self, _pass: u32) -> bool {
        self.step("read_settings")
    }

    fn declare_stable_particles(&mut self, pdg_ids: &[i32]) -> bool {
        self.record.lock().stable_particles.extend(pdg_ids);
        self.step("declare_stable_particles")
    }

    fn declare_special_settings(&mut self, settings: &[String]) -> bool {
        self.record.lock().special_settings.extend_from_slice(settings);
        self.step("declare_special_settings")
    }

    fn initialize_for_internal_partons(&mut self) -> bool {
        self.step("initialize_for_internal_partons")
    }

    fn set_edm_event(&mut self, _event: &Event) {
        self.step("set_edm_event");
    }

    fn randomize_index(&mut self, _lumi: &LuminosityBlock) {
        self.step("randomize_index");
    }

    fn generate_lhe(&mut self, _lumi: &LuminosityBlock, _n_threads: usize) {
        self.step("generate_lhe");
    }

    fn clean_lhe(&mut self) {
        self.step("clean_lhe");
    }

    fn generate_partons_and_hadronize(&mut self) -> bool {
        self.record.lock().engine_attached.push(self.engine.is_some());
        if !self.step("generate_partons_and_hadronize") {
            return false;
        }
        self.attempts += 1;
        let mut event = GenEvent::new(7);
        event.event_scale = f64::from(self.attempts);
        event.weights = vec![0.5];
        event.add_particle(GenParticle::new(15, status::FINAL_STATE, [0., 30., 0., 35.], 1.777));
        self.event = Some(Box::new(event));
        true
    }

    fn decay(&mut self) -> bool {
        self.step("decay")
    }

    fn get_gen_event(&mut self) -> Option<Box<GenEvent>> {
        self.step("get_gen_event");
        if self.fail == Some("get_gen_event") {
            return None;
        }
        self.event.take()
    }

    fn select(&self, _event: &GenEvent) -> bool {
        let mut record = self.record.lock();
        record.calls.push("select");
        record.selections.pop_front().unwrap_or(true)
    }

    fn reset_event(&mut self, event: Box<GenEvent>) {
        self.step("reset_event");
        self.event = Some(event);
    }

    fn residual_decay(&mut self) -> bool {
        self.step("residual_decay")
    }

    fn finalize_event(&mut self) {
        self.step("finalize_event");
    }

    fn statistics(&mut self) {
        self.step("statistics");
        self.record.lock().statistics += 1;
    }

    fn get_gen_event_info(&mut self) -> Option<GenEventInfoProduct> {
        self.provides_info.then(|| GenEventInfoProduct {
            weights: vec![2.],
            signal_process_id: 42,
            ..Default::default()
        })
    }

    fn get_gen_run_info(&self) -> GenRunInfoProduct {
        let mut run_info = GenRunInfoProduct::default();
        run_info.set_internal_xsec(XSec::new(12.5, 0.5));
        run_info
    }

    fn get_gen_lumi_info_header(&self) -> GenLumiInfoHeader {
        GenLumiInfoHeader {
            config_description: "scripted".to_owned(),
            ..Default::default()
        }
    }
}

/// How a [`ScriptedDecayer`] treats the events it is given
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DecayMode {
    /// Return the event it was given
    #[default]
    InPlace,
    /// Return a new event with signal process ID 999
    Replace,
    /// Return nothing
    Empty,
}

#[derive(Debug, Default)]
pub struct ScriptedDecayer {
    pub record: Recorder,
    pub mode: DecayMode,
    pub resources: Vec<String>,
    pub fail_init: bool,
    engine: Option<RandomEngine>,
}

impl ScriptedDecayer {
    pub fn new(record: &Recorder) -> Self {
        ScriptedDecayer {
            record: Arc::clone(record),
            ..Default::default()
        }
    }
}

impl RandomEngineUser for ScriptedDecayer {
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine> {
        std::mem::replace(&mut self.engine, engine)
    }
}

impl Decayer for ScriptedDecayer {
    fn classname(&self) -> &str {
        "ScriptedDecayer"
    }

    fn init(&mut self, _setup: &EventSetup) -> Result<()> {
        self.record.lock().calls.push("decayer_init");
        if self.fail_init {
            return Err(Error::DecayerSetup {
                backend: self.classname().to_owned(),
                reason: "scripted failure".to_owned(),
            });
        }
        Ok(())
    }

    fn operates_on_particles(&self) -> Vec<i32> {
        vec![15, -15]
    }

    fn special_settings(&self) -> Vec<String> {
        vec!["TauDecays:mode = 0".to_owned()]
    }

    fn decay(&mut self, event: Box<GenEvent>) -> Option<Box<GenEvent>> {
        let mut record = self.record.lock();
        record.calls.push("decayer_decay");
        record.decayed.push(event.event_scale);
        match self.mode {
            DecayMode::InPlace => Some(event),
            DecayMode::Replace => {
                let mut replacement = GenEvent::clone(&event);
                replacement.signal_process_id = 999;
                Some(Box::new(replacement))
            }
            DecayMode::Empty => None,
        }
    }

    fn statistics(&mut self) {
        self.record.lock().calls.push("decayer_statistics");
    }

    fn shared_resources(&self) -> Vec<String> {
        self.resources.clone()
    }
}
