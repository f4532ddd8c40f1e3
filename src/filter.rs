//! The generator filter
//!
//! [`GeneratorFilter`] drives a [`Hadronizer`] and an optional
//! [`Decayer`] through the run, luminosity block and event transitions
//! and publishes the resulting records.
use std::sync::Arc;

use tracing::{debug, info};

use crate::data::{GenEventInfoProduct, HepMCProduct};
use crate::decayer::Decayer;
use crate::error::{ConfigurationStep, Error, Result};
use crate::framework::{Event, EventSetup, LuminosityBlock, LuminosityBlockIndex, Run};
use crate::hadronizer::Hadronizer;
use crate::lumi_stats::LumiCounter;
use crate::plugins::Plugins;
use crate::pset::ParameterSet;
use crate::random::{EngineConsumer, EngineKey, RandomEngineSentry, RandomNumberGenerator, ScopeId};
use crate::resources::unique_shared_resource_name;

/// Name of the nested configuration block that enables external decays
pub const EXTERNAL_DECAYS: &str = "ExternalDecays";

pub struct GeneratorFilter {
    hadronizer: Box<dyn Hadronizer>,
    decayer: Option<Box<dyn Decayer>>,
    engines: Arc<RandomNumberGenerator>,
    shared_resources: Vec<String>,
    counter: LumiCounter,
    n_threads: usize,
    initialized: bool,
    open_lumi: Option<LuminosityBlockIndex>,
}

impl GeneratorFilter {
    /// Filter for the given backends
    ///
    /// The shared resources are those of the hadronizer followed by those
    /// of the decayer. If neither declares any, a unique resource name is
    /// used instead.
    pub fn new(
        hadronizer: Box<dyn Hadronizer>,
        decayer: Option<Box<dyn Decayer>>,
        engines: Arc<RandomNumberGenerator>,
    ) -> Self {
        let mut shared_resources = hadronizer.shared_resources();
        if let Some(decayer) = &decayer {
            shared_resources.extend(decayer.shared_resources());
        }
        if shared_resources.is_empty() {
            shared_resources.push(unique_shared_resource_name());
        }
        debug!(
            hadronizer = hadronizer.classname(),
            decayer = decayer.as_ref().map(|d| d.classname()),
            resources = ?shared_resources,
            "created generator filter"
        );
        GeneratorFilter {
            hadronizer,
            decayer,
            engines,
            shared_resources,
            counter: LumiCounter::default(),
            n_threads: 1,
            initialized: false,
            open_lumi: None,
        }
    }

    /// Construct the backends named in `pset`
    ///
    /// A decayer is only created if `pset` has an `ExternalDecays` block.
    pub fn from_pset(
        pset: &ParameterSet,
        plugins: &Plugins,
        engines: Arc<RandomNumberGenerator>,
    ) -> Result<Self> {
        let hadronizer = plugins.make_hadronizer(pset)?;
        let decayer = if pset.exists(EXTERNAL_DECAYS) {
            Some(plugins.make_decayer(pset.get_parameter_set(EXTERNAL_DECAYS)?)?)
        } else {
            None
        };
        Ok(Self::new(hadronizer, decayer, engines))
    }

    /// Upper bound on the number of threads available to the backends
    pub fn prealloc_threads(&mut self, n_threads: usize) {
        self.n_threads = n_threads.max(1);
    }

    pub fn shared_resources(&self) -> &[String] {
        &self.shared_resources
    }

    pub fn hadronizer(&self) -> &dyn Hadronizer {
        self.hadronizer.as_ref()
    }

    pub fn decayer(&self) -> Option<&dyn Decayer> {
        self.decayer.as_deref()
    }

    pub fn engines(&self) -> &Arc<RandomNumberGenerator> {
        &self.engines
    }

    /// Events produced so far in the open luminosity block
    pub fn events_in_luminosity_block(&self) -> u32 {
        self.counter.events()
    }

    /// Whether a luminosity block has been set up successfully
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn begin_luminosity_block_produce(
        &mut self,
        lumi: &mut LuminosityBlock,
        setup: &EventSetup,
    ) -> Result<()> {
        if self.open_lumi.is_some() {
            return Err(Error::Transition {
                transition: "begin_luminosity_block_produce",
                state: "another luminosity block is open",
            });
        }
        debug!(
            run = lumi.run(),
            lumi = lumi.luminosity_block(),
            "beginning luminosity block"
        );
        self.counter.reset();

        let scope = ScopeId::from(lumi.index());
        let mut hadronizer = RandomEngineSentry::new(
            &mut *self.hadronizer,
            &self.engines,
            EngineKey::new(scope, EngineConsumer::Hadronizer),
        )?;
        let mut decayer = match self.decayer.as_deref_mut() {
            Some(decayer) => Some(RandomEngineSentry::new(
                decayer,
                &self.engines,
                EngineKey::new(scope, EngineConsumer::Decayer),
            )?),
            None => None,
        };

        hadronizer.randomize_index(lumi);
        hadronizer.generate_lhe(lumi, self.n_threads);

        if !hadronizer.read_settings(0) {
            return Err(Error::configuration(
                hadronizer.classname(),
                ConfigurationStep::ReadSettings,
            ));
        }
        if let Some(decayer) = decayer.as_mut() {
            decayer.init(setup)?;
            if !hadronizer.declare_stable_particles(&decayer.operates_on_particles()) {
                return Err(Error::configuration(
                    hadronizer.classname(),
                    ConfigurationStep::DeclareStableParticles,
                ));
            }
            if !hadronizer.declare_special_settings(&decayer.special_settings()) {
                return Err(Error::configuration(
                    hadronizer.classname(),
                    ConfigurationStep::DeclareSpecialSettings,
                ));
            }
        }
        if !hadronizer.initialize_for_internal_partons() {
            return Err(Error::configuration(
                hadronizer.classname(),
                ConfigurationStep::InitializeForInternalPartons,
            ));
        }
        let header = hadronizer.get_gen_lumi_info_header();
        drop(decayer);
        drop(hadronizer);

        lumi.put_gen_lumi_info_header(header)?;
        self.initialized = true;
        self.open_lumi = Some(lumi.index());
        Ok(())
    }

    /// Produce one event
    ///
    /// Returns `Ok(false)` if the backends failed to produce an event, in
    /// which case nothing is put into `ev`. Events rejected by the
    /// hadronizer's selection are regenerated until one passes.
    pub fn filter(&mut self, ev: &mut Event) -> Result<bool> {
        if self.open_lumi.is_none() {
            return Err(Error::Transition {
                transition: "filter",
                state: "no luminosity block is open",
            });
        }
        let scope = ScopeId::from(ev.stream_id());
        let mut attempts = 0u32;

        let (mut hadronizer, decayer, event) = loop {
            attempts += 1;
            let mut hadronizer = RandomEngineSentry::new(
                &mut *self.hadronizer,
                &self.engines,
                EngineKey::new(scope, EngineConsumer::Hadronizer),
            )?;
            let mut decayer = match self.decayer.as_deref_mut() {
                Some(decayer) => Some(RandomEngineSentry::new(
                    decayer,
                    &self.engines,
                    EngineKey::new(scope, EngineConsumer::Decayer),
                )?),
                None => None,
            };

            hadronizer.set_edm_event(ev);
            if !hadronizer.generate_partons_and_hadronize() {
                debug!(attempts, "hadronization failed");
                return Ok(false);
            }
            if !hadronizer.decay() {
                debug!(attempts, "internal decay failed");
                return Ok(false);
            }
            let event = match hadronizer.get_gen_event() {
                Some(event) => event,
                None => return Ok(false),
            };
            let event = match decayer.as_mut() {
                Some(decayer) => match decayer.decay(event) {
                    Some(event) => event,
                    None => {
                        debug!(attempts, "nothing left after external decays");
                        return Ok(false);
                    }
                },
                None => event,
            };
            if hadronizer.select(&event) {
                break (hadronizer, decayer, event);
            }
        };
        debug!(attempts, "event passed selection");

        hadronizer.reset_event(event);
        if !hadronizer.residual_decay() {
            debug!("residual decay failed");
            return Ok(false);
        }
        hadronizer.finalize_event();
        let mut event = match hadronizer.get_gen_event() {
            Some(event) => event,
            None => return Ok(false),
        };
        event.set_event_number(ev.id().event);
        let info = hadronizer
            .get_gen_event_info()
            .unwrap_or_else(|| GenEventInfoProduct::from(&*event));
        drop(decayer);
        drop(hadronizer);

        ev.put_gen_event_info(info)?;
        let mut product = HepMCProduct::new();
        product.add_hepmc_data(event);
        ev.put_unsmeared(product)?;
        self.counter.count_event();
        Ok(true)
    }

    /// Release the block-level resources of the hadronizer
    pub fn end_luminosity_block(&mut self, _lumi: &LuminosityBlock) {
        self.hadronizer.clean_lhe();
    }

    pub fn end_luminosity_block_produce(&mut self, lumi: &mut LuminosityBlock) -> Result<()> {
        if self.open_lumi != Some(lumi.index()) {
            return Err(Error::Transition {
                transition: "end_luminosity_block_produce",
                state: "the luminosity block is not open",
            });
        }
        self.hadronizer.statistics();
        if let Some(decayer) = self.decayer.as_mut() {
            decayer.statistics();
        }
        let product = self.counter.gen_lumi_info(&self.hadronizer.get_gen_run_info());
        info!(
            run = lumi.run(),
            lumi = lumi.luminosity_block(),
            events = self.counter.events(),
            "finished luminosity block"
        );
        lumi.put_gen_lumi_info(product)?;
        self.counter.reset();
        self.open_lumi = None;
        Ok(())
    }

    pub fn end_run_produce(&mut self, run: &mut Run) -> Result<()> {
        if self.open_lumi.is_some() {
            return Err(Error::Transition {
                transition: "end_run_produce",
                state: "a luminosity block is still open",
            });
        }
        if self.initialized {
            self.hadronizer.statistics();
            if let Some(decayer) = self.decayer.as_mut() {
                decayer.statistics();
            }
        }
        let run_info = self.hadronizer.get_gen_run_info();
        info!(
            run = run.run(),
            xsec = run_info.internal_xsec().value(),
            error = run_info.internal_xsec().error(),
            "finished run"
        );
        run.put_gen_run_info(run_info)
    }
}
