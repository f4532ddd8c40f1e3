//! A minimal sequential driver
//!
//! Runs a [`GeneratorFilter`] through one run with a fixed number of
//! luminosity blocks and events, the way a framework would, and collects
//! everything the filter published.
use std::sync::Arc;

use tracing::{info, warn};

use crate::data::{GenLumiInfoHeader, GenLumiInfoProduct, GenRunInfoProduct};
use crate::error::Result;
use crate::filter::GeneratorFilter;
use crate::framework::{
    Event, EventID, EventProducts, EventSetup, LuminosityBlock, LuminosityBlockIndex, Run,
    StreamID,
};
use crate::plugins::Plugins;
use crate::pset::ParameterSet;
use crate::random::RandomNumberGenerator;
use crate::resources::SharedResourcesRegistry;

/// Name of the generator configuration block
pub const GENERATOR: &str = "generator";
/// Name of the random number service configuration block
pub const RANDOM_SERVICE: &str = "RandomNumberGeneratorService";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcessConfig {
    pub run: u32,
    pub luminosity_blocks: u32,
    pub events_per_luminosity_block: u64,
    /// Events are assigned to streams round robin
    pub n_streams: u32,
    pub n_threads: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        ProcessConfig {
            run: 1,
            luminosity_blocks: 1,
            events_per_luminosity_block: 10,
            n_streams: 1,
            n_threads: 1,
        }
    }
}

impl ProcessConfig {
    pub fn from_pset(pset: &ParameterSet) -> Result<Self> {
        let default = ProcessConfig::default();
        let config = ProcessConfig {
            run: pset.get_parameter_or("run", default.run)?,
            luminosity_blocks: pset
                .get_parameter_or("numberOfLuminosityBlocks", default.luminosity_blocks)?,
            events_per_luminosity_block: pset.get_parameter_or(
                "eventsPerLuminosityBlock",
                default.events_per_luminosity_block,
            )?,
            n_streams: pset.get_parameter_or("numberOfStreams", default.n_streams)?.max(1),
            n_threads: pset.get_parameter_or("numberOfThreads", default.n_threads)?.max(1),
        };
        Ok(config)
    }
}

/// What happened to one framework event
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: EventID,
    pub stream: StreamID,
    pub produced: bool,
    pub products: EventProducts,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LumiOutput {
    pub luminosity_block: u32,
    pub header: Option<GenLumiInfoHeader>,
    pub info: Option<GenLumiInfoProduct>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunOutput {
    pub run: u32,
    pub events: Vec<EventRecord>,
    pub luminosity_blocks: Vec<LumiOutput>,
    /// All luminosity block summaries merged
    pub lumi_total: Option<GenLumiInfoProduct>,
    pub run_info: Option<GenRunInfoProduct>,
}

impl RunOutput {
    pub fn produced(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter().filter(|record| record.produced)
    }
}

pub struct EventProcessor {
    config: ProcessConfig,
    filter: GeneratorFilter,
    resources: SharedResourcesRegistry,
    setup: EventSetup,
}

impl EventProcessor {
    pub fn new(config: ProcessConfig, mut filter: GeneratorFilter) -> Self {
        filter.prealloc_threads(config.n_threads);
        EventProcessor {
            config,
            filter,
            resources: SharedResourcesRegistry::new(),
            setup: EventSetup::default(),
        }
    }

    /// Set up a process from a configuration
    ///
    /// `pset` holds the driver parameters, a `generator` block for the
    /// filter and optionally a `RandomNumberGeneratorService` block.
    pub fn from_pset(pset: &ParameterSet, plugins: &Plugins) -> Result<Self> {
        let config = ProcessConfig::from_pset(pset)?;
        let engines = if pset.exists(RANDOM_SERVICE) {
            RandomNumberGenerator::from_pset(pset.get_parameter_set(RANDOM_SERVICE)?)?
        } else {
            RandomNumberGenerator::default()
        };
        let generator = pset.get_parameter_set(GENERATOR)?;
        let filter = GeneratorFilter::from_pset(generator, plugins, Arc::new(engines))?;
        Ok(Self::new(config, filter))
    }

    pub fn with_event_setup(mut self, setup: EventSetup) -> Self {
        self.setup = setup;
        self
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn filter(&self) -> &GeneratorFilter {
        &self.filter
    }

    pub fn run(&mut self) -> Result<RunOutput> {
        let config = self.config;
        let resources = self.resources.acquirer(self.filter.shared_resources());
        let mut events = Vec::new();
        let mut luminosity_blocks = Vec::new();
        let mut lumi_total: Option<GenLumiInfoProduct> = None;
        let mut event_number = 0;

        for lumi_number in 1..=config.luminosity_blocks {
            let mut lumi = LuminosityBlock::new(config.run, lumi_number, LuminosityBlockIndex(0));
            {
                let _lock = resources.lock();
                self.filter
                    .begin_luminosity_block_produce(&mut lumi, &self.setup)?;
            }
            for _ in 0..config.events_per_luminosity_block {
                let stream = StreamID((event_number % u64::from(config.n_streams)) as u32);
                event_number += 1;
                let id = EventID::new(config.run, lumi_number, event_number);
                let mut event = Event::new(id, stream);
                let produced = {
                    let _lock = resources.lock();
                    self.filter.filter(&mut event)?
                };
                events.push(EventRecord {
                    id,
                    stream,
                    produced,
                    products: event.into_products(),
                });
            }
            {
                let _lock = resources.lock();
                self.filter.end_luminosity_block(&lumi);
                self.filter.end_luminosity_block_produce(&mut lumi)?;
            }

            let (header, info) = lumi.into_products();
            if let Some(info) = &info {
                match lumi_total.as_mut() {
                    Some(total) => {
                        if !total.merge_product(info) {
                            warn!(lumi = lumi_number, "cannot merge luminosity block summary");
                        }
                    }
                    None => lumi_total = Some(info.clone()),
                }
            }
            luminosity_blocks.push(LumiOutput {
                luminosity_block: lumi_number,
                header,
                info,
            });
        }

        let mut run = Run::new(config.run);
        {
            let _lock = resources.lock();
            self.filter.end_run_produce(&mut run)?;
        }
        let output = RunOutput {
            run: config.run,
            events,
            luminosity_blocks,
            lumi_total,
            run_info: run.into_gen_run_info(),
        };
        info!(
            run = output.run,
            events = output.events.len(),
            produced = output.produced().count(),
            "run complete"
        );
        Ok(output)
    }
}
