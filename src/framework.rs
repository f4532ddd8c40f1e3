//! Records standing in for the host framework's principals
//!
//! An [`Event`], [`LuminosityBlock`] or [`Run`] is handed to the filter
//! at the matching transition and collects what the filter publishes.
//! Every product can be put at most once.
use std::collections::HashMap;

use crate::data::{
    GenEventInfoProduct, GenLumiInfoHeader, GenLumiInfoProduct, GenRunInfoProduct, HepMCProduct,
};
use crate::error::{Error, Result};
use crate::random::ScopeId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamID(pub u32);

/// Slot of a luminosity block that is currently being processed
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LuminosityBlockIndex(pub u32);

impl From<StreamID> for ScopeId {
    fn from(stream: StreamID) -> Self {
        ScopeId::Stream(stream.0)
    }
}

impl From<LuminosityBlockIndex> for ScopeId {
    fn from(index: LuminosityBlockIndex) -> Self {
        ScopeId::LuminosityBlock(index.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventID {
    pub run: u32,
    pub luminosity_block: u32,
    pub event: u64,
}

impl EventID {
    pub fn new(run: u32, luminosity_block: u32, event: u64) -> Self {
        EventID {
            run,
            luminosity_block,
            event,
        }
    }
}

fn put_once<T>(slot: &mut Option<T>, product: T, name: &'static str, principal: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(Error::ProductAlreadyPut {
            product: name,
            principal,
        });
    }
    *slot = Some(product);
    Ok(())
}

/// Products of one event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventProducts {
    pub gen_event_info: Option<GenEventInfoProduct>,
    /// The [`HepMCProduct::UNSMEARED`] event record
    pub unsmeared: Option<HepMCProduct>,
}

impl EventProducts {
    pub fn is_empty(&self) -> bool {
        self.gen_event_info.is_none() && self.unsmeared.is_none()
    }
}

#[derive(Debug)]
pub struct Event {
    id: EventID,
    stream: StreamID,
    products: EventProducts,
}

impl Event {
    pub fn new(id: EventID, stream: StreamID) -> Self {
        Event {
            id,
            stream,
            products: EventProducts::default(),
        }
    }

    pub fn id(&self) -> EventID {
        self.id
    }

    pub fn stream_id(&self) -> StreamID {
        self.stream
    }

    pub fn put_gen_event_info(&mut self, product: GenEventInfoProduct) -> Result<()> {
        put_once(
            &mut self.products.gen_event_info,
            product,
            "GenEventInfoProduct",
            "event",
        )
    }

    pub fn put_unsmeared(&mut self, product: HepMCProduct) -> Result<()> {
        put_once(
            &mut self.products.unsmeared,
            product,
            "HepMCProduct",
            "event",
        )
    }

    pub fn products(&self) -> &EventProducts {
        &self.products
    }

    pub fn into_products(self) -> EventProducts {
        self.products
    }
}

#[derive(Debug)]
pub struct LuminosityBlock {
    run: u32,
    luminosity_block: u32,
    index: LuminosityBlockIndex,
    header: Option<GenLumiInfoHeader>,
    info: Option<GenLumiInfoProduct>,
}

impl LuminosityBlock {
    pub fn new(run: u32, luminosity_block: u32, index: LuminosityBlockIndex) -> Self {
        LuminosityBlock {
            run,
            luminosity_block,
            index,
            header: None,
            info: None,
        }
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn luminosity_block(&self) -> u32 {
        self.luminosity_block
    }

    pub fn index(&self) -> LuminosityBlockIndex {
        self.index
    }

    pub fn put_gen_lumi_info_header(&mut self, header: GenLumiInfoHeader) -> Result<()> {
        put_once(&mut self.header, header, "GenLumiInfoHeader", "luminosity block")
    }

    pub fn put_gen_lumi_info(&mut self, info: GenLumiInfoProduct) -> Result<()> {
        put_once(&mut self.info, info, "GenLumiInfoProduct", "luminosity block")
    }

    pub fn gen_lumi_info_header(&self) -> Option<&GenLumiInfoHeader> {
        self.header.as_ref()
    }

    pub fn gen_lumi_info(&self) -> Option<&GenLumiInfoProduct> {
        self.info.as_ref()
    }

    pub fn into_products(self) -> (Option<GenLumiInfoHeader>, Option<GenLumiInfoProduct>) {
        (self.header, self.info)
    }
}

#[derive(Debug)]
pub struct Run {
    run: u32,
    run_info: Option<GenRunInfoProduct>,
}

impl Run {
    pub fn new(run: u32) -> Self {
        Run { run, run_info: None }
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn put_gen_run_info(&mut self, product: GenRunInfoProduct) -> Result<()> {
        put_once(&mut self.run_info, product, "GenRunInfoProduct", "run")
    }

    pub fn gen_run_info(&self) -> Option<&GenRunInfoProduct> {
        self.run_info.as_ref()
    }

    pub fn into_gen_run_info(self) -> Option<GenRunInfoProduct> {
        self.run_info
    }
}

/// Static properties of a particle species
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleData {
    pub name: &'static str,
    /// Mass in GeV
    pub mass: f64,
    /// Total width in GeV
    pub width: f64,
}

/// Particle properties keyed by the PDG ID of the particle
///
/// Antiparticles share the entry of their particle.
#[derive(Clone, Debug, Default)]
pub struct ParticleDataTable {
    particles: HashMap<i32, ParticleData>,
}

impl ParticleDataTable {
    /// Species the toy backends know about
    pub fn standard() -> Self {
        let entries = [
            (11, "e-", 0.000511, 0.),
            (13, "mu-", 0.10566, 2.996e-19),
            (15, "tau-", 1.77686, 2.265e-12),
            (16, "nu_tau", 0., 0.),
            (22, "gamma", 0., 0.),
            (111, "pi0", 0.13498, 7.8e-9),
            (211, "pi+", 0.13957, 2.53e-17),
            (321, "K+", 0.49368, 5.32e-17),
            (130, "K_L0", 0.49761, 1.29e-17),
            (411, "D+", 1.86966, 6.33e-13),
            (521, "B+", 5.27934, 4.02e-13),
        ];
        let mut table = ParticleDataTable::default();
        for (id, name, mass, width) in entries {
            table.insert(id, ParticleData { name, mass, width });
        }
        table
    }

    pub fn insert(&mut self, pdg_id: i32, data: ParticleData) {
        self.particles.insert(pdg_id.abs(), data);
    }

    pub fn find(&self, pdg_id: i32) -> Option<&ParticleData> {
        self.particles.get(&pdg_id.abs())
    }
}

/// Conditions available to backends at luminosity block begin
#[derive(Clone, Debug)]
pub struct EventSetup {
    pub particle_data: ParticleDataTable,
}

impl Default for EventSetup {
    fn default() -> Self {
        EventSetup {
            particle_data: ParticleDataTable::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn products_are_put_once() {
        let mut event = Event::new(EventID::new(1, 1, 3), StreamID(0));
        assert!(event.products().is_empty());
        event.put_gen_event_info(GenEventInfoProduct::default()).unwrap();
        let err = event.put_gen_event_info(GenEventInfoProduct::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LogicError);
        event.put_unsmeared(HepMCProduct::new()).unwrap();
        assert!(event.put_unsmeared(HepMCProduct::new()).is_err());

        let mut run = Run::new(1);
        run.put_gen_run_info(GenRunInfoProduct::default()).unwrap();
        assert!(run.put_gen_run_info(GenRunInfoProduct::default()).is_err());
    }

    #[test]
    fn antiparticles_share_data() {
        let table = ParticleDataTable::standard();
        assert_eq!(table.find(-15), table.find(15));
        assert_eq!(table.find(211).unwrap().name, "pi+");
        assert!(table.find(6).is_none());
    }

    #[test]
    fn scope_ids() {
        assert_eq!(ScopeId::from(StreamID(3)), ScopeId::Stream(3));
        assert_eq!(
            ScopeId::from(LuminosityBlockIndex(2)),
            ScopeId::LuminosityBlock(2)
        );
    }
}
