//! Deterministic toy generator backends
//!
//! `ToyHadronizer` produces two-parton hard processes, turns them into
//! a spray of light hadrons and decays the short-lived ones.
//! `ToyDecayer` takes over the decays of selected species. Neither
//! aims at physical accuracy: they exist to drive the generation
//! lifecycle with realistic failure, rejection and decay patterns.
use std::collections::{HashSet, VecDeque};
use std::f64::consts::TAU;

use rand::{Rng, RngCore};
use tracing::{debug, info, warn};

use crate::data::{GenEventInfoProduct, GenLumiInfoHeader, GenRunInfoProduct, XSec};
use crate::decayer::Decayer;
use crate::error::{Error, Result};
use crate::framework::{EventSetup, LuminosityBlock, ParticleDataTable};
use crate::gen_event::{GenEvent, GenParticle};
use crate::hadronizer::{BaseHadronizer, Hadronizer};
use crate::pset::ParameterSet;
use crate::random::{RandomEngine, RandomEngineUser};
use crate::status;

/// ħc in GeV mm
const HBARC: f64 = 1.973_269_804e-13;
const ALPHA_EM: f64 = 0.007_297_352_5;
const ALPHA_S_MZ: f64 = 0.118;
const MZ: f64 = 91.1876;
const PROTON_MASS: f64 = 0.938_272;
const MIN_PARTON_PT: f64 = 20.;
const MAX_MULTIPLICITY: u32 = 100_000;

/// Hard processes: ID and incoming parton species
const PROCESSES: [(i32, [i32; 2]); 3] = [(101, [21, 21]), (102, [21, 2]), (103, [2, -2])];

/// Hadron species with their production probabilities
const HADRONS: [(i32, f64); 8] = [
    (211, 0.3),
    (-211, 0.3),
    (111, 0.2),
    (321, 0.05),
    (-321, 0.05),
    (130, 0.04),
    (15, 0.03),
    (-15, 0.03),
];

/// Decay channels of the hadronizer, given for the particle
const INTERNAL_DECAYS: [(i32, &[i32]); 4] = [
    (111, &[22, 22]),
    (15, &[16, -211]),
    (321, &[211, 111]),
    (411, &[-321, 211, 211]),
];

/// Decay channels of the external decayer
const EXTERNAL_DECAYS: [(i32, &[i32]); 1] = [(15, &[16, -211, 111])];

const SELF_CONJUGATE: [i32; 3] = [22, 111, 130];

fn conjugate(pdg_id: i32) -> i32 {
    if SELF_CONJUGATE.contains(&pdg_id.abs()) {
        pdg_id.abs()
    } else {
        -pdg_id
    }
}

fn decay_products(channels: &[(i32, &[i32])], pdg_id: i32) -> Option<Vec<i32>> {
    let (_, products) = channels.iter().find(|(id, _)| *id == pdg_id.abs())?;
    if pdg_id > 0 {
        Some(products.to_vec())
    } else {
        Some(products.iter().map(|id| conjugate(*id)).collect())
    }
}

/// Decay particle `idx` into `products`
///
/// The parent four-momentum is shared out in random fractions and the
/// decay vertex is displaced according to the parent lifetime.
fn decay_into<R: Rng>(
    event: &mut GenEvent,
    idx: usize,
    products: &[i32],
    table: &ParticleDataTable,
    rng: &mut R,
) {
    let parent = &event.particles[idx];
    let p = parent.momentum;
    let fractions: Vec<f64> = products.iter().map(|_| rng.gen_range(0.1..1.)).collect();
    let norm: f64 = fractions.iter().sum();

    let origin = parent
        .production_vertex
        .map(|v| event.vertices[v].position)
        .unwrap_or_default();
    let mut position = origin;
    let width = table.find(parent.pdg_id).map(|d| d.width).unwrap_or(0.);
    let p_abs = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    if width > 0. && parent.generated_mass > 0. && p_abs > 0. {
        let flight = -(1. - rng.gen::<f64>()).ln() * HBARC / width / parent.generated_mass;
        for (x, component) in position.iter_mut().zip(p) {
            *x += flight * component;
        }
    }

    let daughters: Vec<GenParticle> = products
        .iter()
        .zip(&fractions)
        .map(|(&id, f)| {
            let z = f / norm;
            let mass = table.find(id).map(|d| d.mass).unwrap_or(0.);
            GenParticle::new(id, status::FINAL_STATE, p.map(|c| z * c), mass)
        })
        .collect();
    event.decay_particle(idx, daughters, position);
}

/// Decay final-state particles until none with a known channel is left
///
/// Returns the number of decays.
fn decay_all<R, F>(
    event: &mut GenEvent,
    channels: &[(i32, &[i32])],
    table: &ParticleDataTable,
    rng: &mut R,
    keep: F,
) -> usize
where
    R: Rng,
    F: Fn(i32) -> bool,
{
    let mut ndecays = 0;
    let mut idx = 0;
    // decay products are appended, so one pass also covers them
    while idx < event.particles.len() {
        let particle = &event.particles[idx];
        if particle.is_final_state() && !keep(particle.pdg_id) {
            if let Some(products) = decay_products(channels, particle.pdg_id) {
                decay_into(event, idx, &products, table, rng);
                ndecays += 1;
            }
        }
        idx += 1;
    }
    ndecays
}

/// Leading-order hard process before hadronization
#[derive(Clone, Debug, PartialEq)]
struct PartonEvent {
    process_id: i32,
    scale: f64,
    alpha_qcd: f64,
    partons: [(i32, [f64; 4]); 2],
}

fn alpha_s(scale: f64) -> f64 {
    let b0 = 7. / (2. * std::f64::consts::PI);
    ALPHA_S_MZ / (1. + ALPHA_S_MZ * b0 * (scale * scale / (MZ * MZ)).ln())
}

fn generate_parton_event<R: Rng>(rng: &mut R, com_energy: f64) -> PartonEvent {
    let (process_id, ids) = PROCESSES[rng.gen_range(0..PROCESSES.len())];
    let pt = (MIN_PARTON_PT * (1. - rng.gen::<f64>()).powf(-1. / 3.)).min(0.45 * com_energy);
    let phi = rng.gen_range(0.0..TAU);
    let (y1, y2) = (rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
    let momentum = |sign: f64, y: f64| {
        let (sinh, cosh) = (f64::sinh(y), f64::cosh(y));
        [sign * pt * phi.cos(), sign * pt * phi.sin(), pt * sinh, pt * cosh]
    };
    PartonEvent {
        process_id,
        scale: pt,
        alpha_qcd: alpha_s(pt),
        partons: [(ids[0], momentum(1., y1)), (ids[1], momentum(-1., y2))],
    }
}

/// Toy parton generator and hadronizer
///
/// Parameters:
/// - `crossSection`: hard-process cross section in pb (default 1000)
/// - `comEnergy`: centre-of-mass energy in GeV (default 13000)
/// - `multiplicity`: mean number of hadrons (default 10, at most 100000)
/// - `ptMin`: minimum transverse momentum of the leading final-state
///   particle for an event to be selected (default 0)
/// - `failureRate`: probability of a hadronization failure (default 0)
/// - `lhePoolSize`: parton events prepared per luminosity block (default 0)
/// - `sharedResources`: resource names to declare
/// - `RandomizedParameterWeights`: see [`BaseHadronizer::new`]
#[derive(Debug)]
pub struct ToyHadronizer {
    base: BaseHadronizer,
    description: String,
    particle_data: ParticleDataTable,
    cross_section: f64,
    com_energy: f64,
    multiplicity: u32,
    pt_min: f64,
    failure_rate: f64,
    lhe_pool_size: usize,
    shared_resources: Vec<String>,
    stable: HashSet<i32>,
    special_settings: Vec<String>,
    settings_read: bool,
    initialized: bool,
    pool: VecDeque<PartonEvent>,
    ntried: u64,
    naccepted: u64,
}

impl ToyHadronizer {
    pub fn new(pset: &ParameterSet) -> Result<Self> {
        Ok(ToyHadronizer {
            base: BaseHadronizer::new(pset)?,
            description: pset.to_string(),
            particle_data: ParticleDataTable::standard(),
            cross_section: pset.get_parameter_or("crossSection", 1000.)?,
            com_energy: pset.get_parameter_or("comEnergy", 13000.)?,
            multiplicity: pset.get_parameter_or("multiplicity", 10)?,
            pt_min: pset.get_parameter_or("ptMin", 0.)?,
            failure_rate: pset.get_parameter_or("failureRate", 0.)?,
            lhe_pool_size: pset.get_parameter_or("lhePoolSize", 0)?,
            shared_resources: pset.get_vector("sharedResources")?,
            stable: HashSet::new(),
            special_settings: Vec::new(),
            settings_read: false,
            initialized: false,
            pool: VecDeque::new(),
            ntried: 0,
            naccepted: 0,
        })
    }

    pub fn stable_particles(&self) -> &HashSet<i32> {
        &self.stable
    }

    pub fn special_settings(&self) -> &[String] {
        &self.special_settings
    }

    /// Number of parton events left in the block-level pool
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn hadronize<R: Rng>(&self, partons: &PartonEvent, rng: &mut R) -> GenEvent {
        let mut event = GenEvent::new(partons.process_id);
        event.event_scale = partons.scale;
        event.alpha_qcd = partons.alpha_qcd;
        event.alpha_qed = ALPHA_EM;
        event.weights = vec![1.];

        let beam_energy = 0.5 * self.com_energy;
        let collision = event.add_vertex([0.; 4]);
        for sign in [1., -1.] {
            let mut beam = GenParticle::new(
                2212,
                status::BEAM,
                [0., 0., sign * beam_energy, beam_energy],
                PROTON_MASS,
            );
            beam.end_vertex = Some(collision);
            event.add_particle(beam);
        }

        let hadronization = event.add_vertex([0.; 4]);
        for (id, p) in &partons.partons {
            let mut parton = GenParticle::new(*id, status::HADRONIZED, *p, 0.);
            parton.production_vertex = Some(collision);
            parton.end_vertex = Some(hadronization);
            event.add_particle(parton);
        }

        let mean_pt = 2. * partons.scale / f64::from(self.multiplicity);
        let nhadrons = rng.gen_range(self.multiplicity / 2..=self.multiplicity * 3 / 2).max(1);
        for _ in 0..nhadrons {
            let mut roll = rng.gen::<f64>();
            let mut id = HADRONS[0].0;
            for (species, probability) in HADRONS {
                id = species;
                roll -= probability;
                if roll < 0. {
                    break;
                }
            }
            let mass = self.particle_data.find(id).map(|d| d.mass).unwrap_or(0.);
            let pt = -mean_pt * (1. - rng.gen::<f64>()).ln();
            let eta = rng.gen_range(-2.5..2.5);
            let phi = rng.gen_range(0.0..TAU);
            let pz = pt * f64::sinh(eta);
            let e = (pt * pt + pz * pz + mass * mass).sqrt();
            let mut hadron = GenParticle::new(
                id,
                status::FINAL_STATE,
                [pt * phi.cos(), pt * phi.sin(), pz, e],
                mass,
            );
            hadron.production_vertex = Some(hadronization);
            event.add_particle(hadron);
        }
        event
    }
}

impl RandomEngineUser for ToyHadronizer {
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine> {
        self.base.set_random_engine(engine)
    }
}

impl Hadronizer for ToyHadronizer {
    fn classname(&self) -> &str {
        "ToyHadronizer"
    }

    fn shared_resources(&self) -> Vec<String> {
        self.shared_resources.clone()
    }

    fn read_settings(&mut self, pass: u32) -> bool {
        self.settings_read = self.cross_section > 0.
            && self.com_energy > 2. * PROTON_MASS
            && (1..=MAX_MULTIPLICITY).contains(&self.multiplicity)
            && (0. ..1.).contains(&self.failure_rate);
        debug!(pass, ok = self.settings_read, "read toy hadronizer settings");
        self.settings_read
    }

    fn declare_stable_particles(&mut self, pdg_ids: &[i32]) -> bool {
        if let Some(unknown) = pdg_ids.iter().find(|id| self.particle_data.find(**id).is_none()) {
            warn!(pdg_id = unknown, "cannot keep unknown species stable");
            return false;
        }
        self.stable.extend(pdg_ids);
        true
    }

    fn declare_special_settings(&mut self, settings: &[String]) -> bool {
        if let Some(bad) = settings.iter().find(|s| !s.contains('=')) {
            warn!(setting = %bad, "special setting is not of the form 'key = value'");
            return false;
        }
        self.special_settings = settings.to_vec();
        true
    }

    fn initialize_for_internal_partons(&mut self) -> bool {
        self.initialized = self.settings_read;
        self.initialized
    }

    fn randomize_index(&mut self, _lumi: &LuminosityBlock) {
        self.base.randomize_index();
    }

    fn generate_lhe(&mut self, lumi: &LuminosityBlock, n_threads: usize) {
        if self.lhe_pool_size == 0 {
            return;
        }
        let engine = match self.base.engine() {
            Some(engine) => engine,
            None => {
                warn!("no random engine attached, not preparing parton events");
                return;
            }
        };
        let n_threads = n_threads.max(1);
        let seeds: Vec<u64> = (0..n_threads).map(|_| engine.next_u64()).collect();
        let (size, n_workers) = (self.lhe_pool_size, seeds.len());
        let com_energy = self.com_energy;
        let chunks: Vec<Vec<PartonEvent>> = std::thread::scope(|scope| {
            let workers: Vec<_> = seeds
                .into_iter()
                .enumerate()
                .map(|(i, seed)| {
                    let n = size / n_workers + usize::from(i < size % n_workers);
                    scope.spawn(move || {
                        let mut rng = RandomEngine::new(seed, 0);
                        (0..n)
                            .map(|_| generate_parton_event(&mut rng, com_energy))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        self.pool = chunks.into_iter().flatten().collect();
        info!(
            lumi = lumi.luminosity_block(),
            events = self.pool.len(),
            threads = n_threads,
            "prepared parton-level events"
        );
    }

    fn clean_lhe(&mut self) {
        self.pool.clear();
    }

    fn generate_partons_and_hadronize(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        let mut engine = match self.base.set_random_engine(None) {
            Some(engine) => engine,
            None => return false,
        };
        self.ntried += 1;
        let event = if engine.flat() < self.failure_rate {
            None
        } else {
            let partons = match self.pool.pop_front() {
                Some(partons) => partons,
                None => generate_parton_event(&mut engine, self.com_energy),
            };
            Some(self.hadronize(&partons, &mut engine))
        };
        self.base.set_random_engine(Some(engine));
        match event {
            Some(event) => {
                self.base.reset_event(Box::new(event));
                true
            }
            None => false,
        }
    }

    fn decay(&mut self) -> bool {
        let mut engine = match self.base.set_random_engine(None) {
            Some(engine) => engine,
            None => return false,
        };
        let stable = &self.stable;
        let ndecays = self.base.event_mut().map(|event| {
            decay_all(
                event,
                &INTERNAL_DECAYS,
                &self.particle_data,
                &mut engine,
                |id| stable.contains(&id),
            )
        });
        self.base.set_random_engine(Some(engine));
        ndecays.is_some()
    }

    fn get_gen_event(&mut self) -> Option<Box<GenEvent>> {
        self.base.take_event()
    }

    fn select(&self, event: &GenEvent) -> bool {
        event
            .final_state()
            .map(|idx| event.particles[idx].pt())
            .fold(0., f64::max)
            >= self.pt_min
    }

    fn reset_event(&mut self, event: Box<GenEvent>) {
        self.base.reset_event(event);
    }

    fn residual_decay(&mut self) -> bool {
        let mut engine = match self.base.set_random_engine(None) {
            Some(engine) => engine,
            None => return false,
        };
        let ndecays = self.base.event_mut().map(|event| {
            decay_all(
                event,
                &INTERNAL_DECAYS,
                &self.particle_data,
                &mut engine,
                |_| false,
            )
        });
        self.base.set_random_engine(Some(engine));
        ndecays.is_some()
    }

    fn finalize_event(&mut self) {
        self.naccepted += 1;
        if let Some(event) = self.base.event() {
            let mut info = GenEventInfoProduct::from(event);
            info.binning_values = vec![event.event_scale];
            self.base.set_event_info(info);
        }
    }

    fn statistics(&mut self) {
        if self.ntried == 0 {
            return;
        }
        let efficiency = self.naccepted as f64 / self.ntried as f64;
        let error = (efficiency * (1. - efficiency) / self.ntried as f64).sqrt();
        let xsec = XSec::new(self.cross_section * efficiency, self.cross_section * error);
        info!(
            tried = self.ntried,
            accepted = self.naccepted,
            xsec = xsec.value(),
            error = xsec.error(),
            "toy hadronizer statistics"
        );
        self.base.run_info_mut().set_internal_xsec(xsec);
    }

    fn get_gen_event_info(&mut self) -> Option<GenEventInfoProduct> {
        self.base.take_event_info()
    }

    fn get_gen_run_info(&self) -> GenRunInfoProduct {
        self.base.run_info().clone()
    }

    fn get_gen_lumi_info_header(&self) -> GenLumiInfoHeader {
        let mut header = self.base.gen_lumi_info_header(self.description.clone());
        header.weight_names = vec!["nominal".to_owned()];
        if !self.pool.is_empty() {
            let ebeam = 0.5 * self.com_energy;
            let mut init = vec![format!("2212 2212 {} {}", ebeam, ebeam)];
            for (process_id, _) in PROCESSES {
                let n = self.pool.iter().filter(|p| p.process_id == process_id).count();
                init.push(format!("{} {}", process_id, n));
            }
            header.lhe_headers.push(("init".to_owned(), init));
        }
        header
    }
}

/// Toy external decay package
///
/// Parameters:
/// - `particles`: species to decay (default "15 -15")
/// - `specialSettings`: `;`-separated settings for the hadronizer
/// - `replaceEvent`: hand back a fresh copy instead of the event passed in
/// - `sharedResources`: resource names to declare
#[derive(Debug)]
pub struct ToyDecayer {
    particles: Vec<i32>,
    special_settings: Vec<String>,
    replace_event: bool,
    shared_resources: Vec<String>,
    particle_data: ParticleDataTable,
    engine: Option<RandomEngine>,
    ndecays: u64,
}

impl ToyDecayer {
    pub fn new(pset: &ParameterSet) -> Result<Self> {
        let particles = if pset.exists("particles") {
            pset.get_vector("particles")?
        } else {
            vec![15, -15]
        };
        let special_settings = pset
            .get_parameter_or("specialSettings", String::new())?
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(ToyDecayer {
            particles,
            special_settings,
            replace_event: pset.get_parameter_or("replaceEvent", false)?,
            shared_resources: pset.get_vector("sharedResources")?,
            particle_data: ParticleDataTable::default(),
            engine: None,
            ndecays: 0,
        })
    }

    pub fn ndecays(&self) -> u64 {
        self.ndecays
    }
}

impl RandomEngineUser for ToyDecayer {
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine> {
        std::mem::replace(&mut self.engine, engine)
    }
}

impl Decayer for ToyDecayer {
    fn classname(&self) -> &str {
        "ToyDecayer"
    }

    fn init(&mut self, setup: &EventSetup) -> Result<()> {
        for &id in &self.particles {
            if decay_products(&EXTERNAL_DECAYS, id).is_none() || setup.particle_data.find(id).is_none() {
                return Err(Error::DecayerSetup {
                    backend: self.classname().to_owned(),
                    reason: format!("no decay channel for particle {}", id),
                });
            }
        }
        self.particle_data = setup.particle_data.clone();
        Ok(())
    }

    fn operates_on_particles(&self) -> Vec<i32> {
        self.particles.clone()
    }

    fn special_settings(&self) -> Vec<String> {
        self.special_settings.clone()
    }

    fn decay(&mut self, mut event: Box<GenEvent>) -> Option<Box<GenEvent>> {
        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => {
                warn!("no random engine attached, leaving event undecayed");
                return Some(event);
            }
        };
        let particles = &self.particles;
        self.ndecays += decay_all(
            &mut event,
            &EXTERNAL_DECAYS,
            &self.particle_data,
            engine,
            |id| !particles.contains(&id),
        ) as u64;
        if self.replace_event {
            Some(Box::new((*event).clone()))
        } else {
            Some(event)
        }
    }

    fn statistics(&mut self) {
        info!(decays = self.ndecays, "toy decayer statistics");
    }

    fn shared_resources(&self) -> Vec<String> {
        self.shared_resources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::LuminosityBlockIndex;

    fn started(pset: &ParameterSet) -> ToyHadronizer {
        let mut hadronizer = ToyHadronizer::new(pset).unwrap();
        hadronizer.set_random_engine(Some(RandomEngine::new(11, 0)));
        assert!(hadronizer.read_settings(0));
        assert!(hadronizer.initialize_for_internal_partons());
        hadronizer
    }

    fn final_state_ids(event: &GenEvent) -> Vec<i32> {
        event.final_state().map(|idx| event.particles[idx].pdg_id).collect()
    }

    #[test]
    fn short_lived_particles_are_decayed() {
        let mut hadronizer = started(&ParameterSet::new("toy").with_parameter("multiplicity", 40));
        for _ in 0..20 {
            assert!(hadronizer.generate_partons_and_hadronize());
            assert!(hadronizer.decay());
            let event = hadronizer.get_gen_event().unwrap();
            assert_eq!(event.particles.iter().filter(|p| p.status == status::BEAM).count(), 2);
            for id in final_state_ids(&event) {
                assert!(![111, 15, 321].contains(&id.abs()), "{} left undecayed", id);
            }
            for vertex in &event.vertices {
                for &out in &vertex.outgoing {
                    assert!(event.particles[out].production_vertex.is_some());
                }
            }
        }
    }

    #[test]
    fn stable_particles_survive_internal_decay() {
        let mut hadronizer = started(&ParameterSet::new("toy").with_parameter("multiplicity", 400));
        assert!(hadronizer.declare_stable_particles(&[15, -15]));
        assert!(!hadronizer.declare_stable_particles(&[9999]));
        assert!(hadronizer.generate_partons_and_hadronize());
        assert!(hadronizer.decay());
        let event = hadronizer.get_gen_event().unwrap();
        assert!(final_state_ids(&event).iter().any(|id| id.abs() == 15));
        assert!(!final_state_ids(&event).contains(&111));

        hadronizer.reset_event(event);
        assert!(hadronizer.residual_decay());
        let event = hadronizer.get_gen_event().unwrap();
        assert!(!final_state_ids(&event).iter().any(|id| id.abs() == 15));
    }

    #[test]
    fn external_decays_leave_residual_work() {
        let mut hadronizer = started(&ParameterSet::new("toy").with_parameter("multiplicity", 400));
        let mut decayer = ToyDecayer::new(&ParameterSet::new("ExternalDecays")).unwrap();
        decayer.init(&EventSetup::default()).unwrap();
        decayer.set_random_engine(Some(RandomEngine::new(11, 1)));
        assert!(hadronizer.declare_stable_particles(&decayer.operates_on_particles()));

        assert!(hadronizer.generate_partons_and_hadronize());
        assert!(hadronizer.decay());
        let event = decayer.decay(hadronizer.get_gen_event().unwrap()).unwrap();
        assert!(decayer.ndecays() > 0);
        let ids = final_state_ids(&event);
        assert!(!ids.iter().any(|id| id.abs() == 15));
        assert!(ids.contains(&111));

        hadronizer.reset_event(event);
        assert!(hadronizer.residual_decay());
        let event = hadronizer.get_gen_event().unwrap();
        assert!(!final_state_ids(&event).contains(&111));
    }

    #[test]
    fn decayer_setup() {
        let pset = ParameterSet::new("ExternalDecays")
            .with_parameter("particles", "15")
            .with_parameter("specialSettings", "TauDecays:mode = 0; ; ParticleDecays:limitTau0 = on");
        let decayer = ToyDecayer::new(&pset).unwrap();
        assert_eq!(decayer.operates_on_particles(), vec![15]);
        assert_eq!(
            decayer.special_settings(),
            vec!["TauDecays:mode = 0", "ParticleDecays:limitTau0 = on"]
        );

        let mut unknown = ToyDecayer::new(&ParameterSet::new("ExternalDecays").with_parameter("particles", "211")).unwrap();
        assert!(unknown.init(&EventSetup::default()).is_err());

        let mut hadronizer = ToyHadronizer::new(&ParameterSet::new("toy")).unwrap();
        assert!(hadronizer.declare_special_settings(&decayer.special_settings()));
        assert!(!hadronizer.declare_special_settings(&["TauDecays".to_owned()]));
    }

    #[test]
    fn configuration_is_validated() {
        let mut hadronizer = ToyHadronizer::new(&ParameterSet::new("toy").with_parameter("crossSection", -1)).unwrap();
        assert!(!hadronizer.read_settings(0));
        assert!(!hadronizer.initialize_for_internal_partons());
        assert!(!hadronizer.generate_partons_and_hadronize());
        assert!(ToyHadronizer::new(&ParameterSet::new("toy").with_parameter("multiplicity", "many")).is_err());
        let mut crowded =
            ToyHadronizer::new(&ParameterSet::new("toy").with_parameter("multiplicity", 3_000_000_000u32)).unwrap();
        assert!(!crowded.read_settings(0));
        assert!(!crowded.initialize_for_internal_partons());
        assert!(!crowded.generate_partons_and_hadronize());
    }

    #[test]
    fn selection_and_cross_section() {
        let mut hadronizer = started(&ParameterSet::new("toy").with_parameter("ptMin", 1e9));
        assert!(hadronizer.generate_partons_and_hadronize());
        let event = hadronizer.get_gen_event().unwrap();
        assert!(!hadronizer.select(&event));
        hadronizer.reset_event(event);
        hadronizer.finalize_event();
        assert!(hadronizer.get_gen_event_info().is_some());
        assert!(hadronizer.get_gen_event_info().is_none());

        hadronizer.statistics();
        let xsec = *hadronizer.get_gen_run_info().internal_xsec();
        assert_eq!(xsec, XSec::new(1000., 0.));
    }

    #[test]
    fn parton_pool_is_reproducible() {
        let pset = ParameterSet::new("toy").with_parameter("lhePoolSize", 25);
        let lumi = LuminosityBlock::new(1, 1, LuminosityBlockIndex(0));
        let mut one = started(&pset);
        let mut four = started(&pset);
        one.generate_lhe(&lumi, 1);
        four.generate_lhe(&lumi, 4);
        assert_eq!(one.pool_len(), 25);
        assert_eq!(four.pool_len(), 25);

        let mut again = started(&pset);
        again.generate_lhe(&lumi, 4);
        assert_eq!(again.pool, four.pool);

        let header = four.get_gen_lumi_info_header();
        let (name, init) = &header.lhe_headers[0];
        assert_eq!(name, "init");
        assert_eq!(init[0], "2212 2212 6500 6500");
        let pooled: usize = init[1..]
            .iter()
            .map(|line| line.split_whitespace().nth(1).unwrap().parse::<usize>().unwrap())
            .sum();
        assert_eq!(pooled, 25);

        four.clean_lhe();
        assert_eq!(four.pool_len(), 0);
        assert!(four.get_gen_lumi_info_header().lhe_headers.is_empty());
    }
}
