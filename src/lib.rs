//! Drive an event generator through run, luminosity block and event
//! transitions.
//!
//! A [`GeneratorFilter`] owns a [`Hadronizer`] and optionally a
//! [`Decayer`] for external decays. For every framework event it
//! generates, decays and selects events until one passes, then publishes
//! the final event together with its summary. Luminosity block and run
//! summaries are published at the end of the respective scope and can be
//! stored with the summary [`Writer`] and [`Reader`].
//!
//! # Example
//!
//! ```rust
//! use genfilter::{EventProcessor, ParameterSet, Plugins};
//!
//! let config: ParameterSet = r#"
//!   <process eventsPerLuminosityBlock="3">
//!     <generator hadronizer="toy" crossSection="5.2e4">
//!       <ExternalDecays decayer="toy"/>
//!     </generator>
//!   </process>"#
//!     .parse()
//!     .unwrap();
//! let mut process = EventProcessor::from_pset(&config, &Plugins::builtin()).unwrap();
//! let output = process.run().unwrap();
//! assert_eq!(output.produced().count(), 3);
//! ```
pub mod data;
pub mod decayer;
pub mod error;
pub mod filter;
pub mod framework;
pub mod gen_event;
pub mod hadronizer;
pub mod lumi_stats;
pub mod plugins;
pub mod process;
pub mod pset;
pub mod random;
pub mod reader;
pub mod resources;
pub mod status;
pub mod toy;
pub mod writer;
mod tags;
#[cfg(test)]
mod testing;

pub use data::*;
pub use decayer::Decayer;
pub use error::{ConfigurationStep, Error, ErrorKind, Result};
pub use filter::GeneratorFilter;
pub use framework::*;
pub use gen_event::{GenEvent, GenParticle, GenVertex};
pub use hadronizer::{BaseHadronizer, Hadronizer};
pub use plugins::Plugins;
pub use process::{EventProcessor, EventRecord, LumiOutput, ProcessConfig, RunOutput};
pub use pset::{ParameterError, ParameterSet, XmlTree};
pub use random::{
    EngineConsumer, EngineKey, RandomEngine, RandomEngineSentry, RandomEngineUser,
    RandomNumberGenerator, ScopeId,
};
pub use reader::*;
pub use writer::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lumi_stats::LumiCounter;
    use flate2::bufread::GzDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io;

    const TOY_PROCESS: &str = r#"
<process numberOfLuminosityBlocks="2" eventsPerLuminosityBlock="5" numberOfStreams="2">
  <RandomNumberGeneratorService masterSeed="4711"/>
  <generator hadronizer="toy" crossSection="5.2e4" ptMin="10" lhePoolSize="4">
    <ExternalDecays decayer="toy" particles="15 -15" specialSettings="TauDecays:external = on"/>
  </generator>
</process>"#;

    fn toy_run() -> RunOutput {
        let config: ParameterSet = TOY_PROCESS.parse().unwrap();
        let mut process = EventProcessor::from_pset(&config, &Plugins::builtin()).unwrap();
        assert_eq!(process.filter().decayer().map(|d| d.classname()), Some("ToyDecayer"));
        process.run().unwrap()
    }

    #[test]
    fn toy_generation() {
        let output = toy_run();
        assert_eq!(output.events.len(), 10);
        assert_eq!(output.produced().count(), 10);
        for record in output.produced() {
            let event = record.products.unsmeared.as_ref().unwrap().get_hepmc_data().unwrap();
            assert_eq!(event.event_number, record.id.event);
            assert!(event
                .final_state()
                .all(|idx| ![15, 111].contains(&event.particles[idx].pdg_id.abs())));
            let info = record.products.gen_event_info.as_ref().unwrap();
            assert_eq!(info.signal_process_id, event.signal_process_id);
        }
        for lumi in &output.luminosity_blocks {
            let header = lumi.header.as_ref().unwrap();
            assert_eq!(header.weight_names, vec!["nominal"]);
            assert_eq!(lumi.info.as_ref().unwrap().process_infos()[0].n_total_pos, 5);
        }
        let total = &output.lumi_total.as_ref().unwrap().process_infos()[0];
        assert_eq!(total.n_total_pos, 10);
        let xsec = output.run_info.as_ref().unwrap().internal_xsec().value();
        assert!(xsec > 0. && xsec <= 5.2e4);
    }

    #[test]
    fn same_seed_same_events() {
        assert_eq!(toy_run(), toy_run());
    }

    #[test]
    fn different_seed_different_events() {
        let config: ParameterSet = TOY_PROCESS.replace("4711", "4712").parse().unwrap();
        let mut process = EventProcessor::from_pset(&config, &Plugins::builtin()).unwrap();
        let output = process.run().unwrap();
        assert_ne!(output.events, toy_run().events);
    }

    #[test]
    fn no_decayer_without_external_decays() {
        let config: ParameterSet = r#"<generator hadronizer="toy"/>"#.parse().unwrap();
        let engines = std::sync::Arc::new(RandomNumberGenerator::default());
        let filter = GeneratorFilter::from_pset(&config, &Plugins::builtin(), engines).unwrap();
        assert!(filter.decayer().is_none());
        assert_eq!(filter.hadronizer().classname(), "ToyHadronizer");
    }

    #[test]
    fn test_read_write() {
        let mut counter = LumiCounter::default();
        for _ in 0..1234 {
            counter.count_event();
        }
        let mut run_info = GenRunInfoProduct::default();
        run_info.set_internal_xsec(XSec::new(4.2781e-3, 1.1e-5));
        run_info.set_filter_efficiency(0.37);
        let lumi = counter.gen_lumi_info(&run_info);

        let compressed = {
            let encoder = GzEncoder::new(Vec::new(), Compression::default());
            let mut writer = Writer::new(encoder, "1.0").unwrap();
            writer.write_lumi(&lumi).unwrap();
            writer.write_run(&run_info).unwrap();
            writer.finish().unwrap().finish().unwrap()
        };

        let reader = Reader::new(io::BufReader::new(GzDecoder::new(&compressed[..]))).unwrap();
        assert_eq!(reader.version(), "1.0");
        let records: Vec<_> = reader.collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(records, vec![Summary::Lumi(lumi.clone()), Summary::Run(run_info)]);
        let Summary::Lumi(read) = &records[0] else {
            panic!("expected luminosity block summary")
        };
        assert_eq!(read.process_infos(), lumi.process_infos());
        assert_eq!(read.process_infos()[0].tried, FinalStat::new(1234, 1234., 1234.));
    }
}
