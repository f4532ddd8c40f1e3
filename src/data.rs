//! Records published by the generator filter
use crate::gen_event::GenEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-event generator summary
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct GenEventInfoProduct {
    /// Event weights
    pub weights: Vec<f64>,
    /// ID of the hard process
    pub signal_process_id: i32,
    /// Scale of the hard process in GeV
    pub q_scale: f64,
    /// Value of the QCD coupling α_s
    pub alpha_qcd: f64,
    /// Value of the QED coupling α
    pub alpha_qed: f64,
    /// Values the generator used to bin the phase space, if any
    pub binning_values: Vec<f64>,
}

impl GenEventInfoProduct {
    /// Total event weight, the product of all individual weights
    pub fn weight(&self) -> f64 {
        self.weights.iter().product()
    }
}

impl From<&GenEvent> for GenEventInfoProduct {
    fn from(event: &GenEvent) -> Self {
        GenEventInfoProduct {
            weights: event.weights.clone(),
            signal_process_id: event.signal_process_id,
            q_scale: event.event_scale,
            alpha_qcd: event.alpha_qcd,
            alpha_qed: event.alpha_qed,
            binning_values: Vec::new(),
        }
    }
}

/// Event-data record wrapping the final [`GenEvent`]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct HepMCProduct {
    event: Option<Box<GenEvent>>,
}

impl HepMCProduct {
    /// Product label under which the filter publishes its events
    pub const UNSMEARED: &'static str = "unsmeared";

    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `event`, replacing any event held before
    pub fn add_hepmc_data(&mut self, event: Box<GenEvent>) {
        self.event = Some(event);
    }

    pub fn get_hepmc_data(&self) -> Option<&GenEvent> {
        self.event.as_deref()
    }

    pub fn into_hepmc_data(self) -> Option<Box<GenEvent>> {
        self.event
    }
}

/// Cross section with its error, in pb
///
/// A negative value or error means "unknown".
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct XSec {
    value: f64,
    error: f64,
}

impl Default for XSec {
    fn default() -> Self {
        XSec {
            value: -1.,
            error: -1.,
        }
    }
}

impl XSec {
    pub fn new(value: f64, error: f64) -> Self {
        XSec { value, error }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn is_set(&self) -> bool {
        self.value >= 0.
    }
}

/// Run-level generator summary
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone)]
pub struct GenRunInfoProduct {
    internal_xsec: XSec,
    external_xsec_lo: XSec,
    external_xsec_nlo: XSec,
    filter_efficiency: f64,
}

impl Default for GenRunInfoProduct {
    fn default() -> Self {
        GenRunInfoProduct {
            internal_xsec: XSec::default(),
            external_xsec_lo: XSec::default(),
            external_xsec_nlo: XSec::default(),
            filter_efficiency: -1.,
        }
    }
}

impl GenRunInfoProduct {
    /// Cross section as estimated by the generator itself
    pub fn internal_xsec(&self) -> &XSec {
        &self.internal_xsec
    }

    pub fn set_internal_xsec(&mut self, xsec: XSec) {
        self.internal_xsec = xsec;
    }

    pub fn external_xsec_lo(&self) -> &XSec {
        &self.external_xsec_lo
    }

    pub fn set_external_xsec_lo(&mut self, xsec: XSec) {
        self.external_xsec_lo = xsec;
    }

    pub fn external_xsec_nlo(&self) -> &XSec {
        &self.external_xsec_nlo
    }

    pub fn set_external_xsec_nlo(&mut self, xsec: XSec) {
        self.external_xsec_nlo = xsec;
    }

    pub fn filter_efficiency(&self) -> f64 {
        self.filter_efficiency
    }

    pub fn set_filter_efficiency(&mut self, efficiency: f64) {
        self.filter_efficiency = efficiency;
    }

    /// Whether two products describe the same sample configuration
    pub fn is_product_equal(&self, other: &Self) -> bool {
        self.external_xsec_lo == other.external_xsec_lo
            && self.external_xsec_nlo == other.external_xsec_nlo
            && self.filter_efficiency == other.filter_efficiency
    }

    /// Combine the internal cross sections of two parts of a sample
    ///
    /// The estimates are averaged with inverse-variance weights. Returns
    /// `false` and leaves `self` untouched if the products are not
    /// compatible.
    pub fn merge_product(&mut self, other: &Self) -> bool {
        if !self.is_product_equal(other) {
            return false;
        }
        let (mine, theirs) = (self.internal_xsec, other.internal_xsec);
        self.internal_xsec = if !theirs.is_set() {
            mine
        } else if !mine.is_set() {
            theirs
        } else if mine.error > 0. && theirs.error > 0. {
            let w1 = 1. / (mine.error * mine.error);
            let w2 = 1. / (theirs.error * theirs.error);
            XSec::new(
                (mine.value * w1 + theirs.value * w2) / (w1 + w2),
                1. / (w1 + w2).sqrt(),
            )
        } else {
            XSec::new(0.5 * (mine.value + theirs.value), -1.)
        };
        true
    }
}

/// Per-luminosity-block metadata published at block begin
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone)]
pub struct GenLumiInfoHeader {
    /// Index of the randomly chosen generator configuration, -1 if unused
    pub random_config_index: i32,
    /// Description of the generator configuration
    pub config_description: String,
    /// Names of the event weights, in order
    pub weight_names: Vec<String>,
    /// Named header blocks from the parton-level input
    pub lhe_headers: Vec<(String, Vec<String>)>,
}

impl Default for GenLumiInfoHeader {
    fn default() -> Self {
        GenLumiInfoHeader {
            random_config_index: -1,
            config_description: String::new(),
            weight_names: Vec::new(),
            lhe_headers: Vec::new(),
        }
    }
}

/// Number of entries together with their sum of weights and of squared weights
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Copy, Clone, Default)]
pub struct FinalStat {
    pub n: u32,
    pub sum: f64,
    pub sum2: f64,
}

impl FinalStat {
    pub fn new(n: u32, sum: f64, sum2: f64) -> Self {
        FinalStat { n, sum, sum2 }
    }

    /// Statistics that were not computed
    pub fn unknown() -> Self {
        FinalStat::new(0, -1., -1.)
    }

    pub fn is_known(&self) -> bool {
        self.sum >= 0.
    }

    fn add(&mut self, other: &FinalStat) {
        if !self.is_known() || !other.is_known() {
            *self = FinalStat::unknown();
            return;
        }
        self.n += other.n;
        self.sum += other.sum;
        self.sum2 += other.sum2;
    }
}

/// Event counters and cross section for one physics process
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ProcessInfo {
    pub process: i32,
    pub lhe_xsec: XSec,
    pub n_pass_pos: u32,
    pub n_pass_neg: u32,
    pub n_total_pos: u32,
    pub n_total_neg: u32,
    pub tried: FinalStat,
    pub selected: FinalStat,
    pub killed: FinalStat,
    pub accepted: FinalStat,
    pub accepted_br: FinalStat,
}

impl ProcessInfo {
    pub fn n_total(&self) -> u32 {
        self.n_total_pos + self.n_total_neg
    }

    fn merge(&mut self, other: &ProcessInfo) {
        let (n1, n2) = (self.n_total() as f64, other.n_total() as f64);
        let (x1, x2) = (self.lhe_xsec, other.lhe_xsec);
        if !x1.is_set() {
            self.lhe_xsec = x2;
        } else if x2.is_set() && n1 + n2 > 0. {
            let value = (x1.value * n1 + x2.value * n2) / (n1 + n2);
            let error = if x1.error >= 0. && x2.error >= 0. {
                (x1.error * n1).hypot(x2.error * n2) / (n1 + n2)
            } else {
                -1.
            };
            self.lhe_xsec = XSec::new(value, error);
        }
        self.n_pass_pos += other.n_pass_pos;
        self.n_pass_neg += other.n_pass_neg;
        self.n_total_pos += other.n_total_pos;
        self.n_total_neg += other.n_total_neg;
        self.tried.add(&other.tried);
        self.selected.add(&other.selected);
        self.killed.add(&other.killed);
        self.accepted.add(&other.accepted);
        self.accepted_br.add(&other.accepted_br);
    }
}

/// Per-luminosity-block generator summary published at block end
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone)]
pub struct GenLumiInfoProduct {
    hepidwtup: i32,
    process_infos: Vec<ProcessInfo>,
}

impl Default for GenLumiInfoProduct {
    fn default() -> Self {
        GenLumiInfoProduct {
            hepidwtup: -1,
            process_infos: Vec::new(),
        }
    }
}

impl GenLumiInfoProduct {
    pub fn new(hepidwtup: i32, process_infos: Vec<ProcessInfo>) -> Self {
        GenLumiInfoProduct {
            hepidwtup,
            process_infos,
        }
    }

    /// Les Houches weight strategy, -1 if unknown
    pub fn hepidwtup(&self) -> i32 {
        self.hepidwtup
    }

    pub fn set_hepidwtup(&mut self, hepidwtup: i32) {
        self.hepidwtup = hepidwtup;
    }

    pub fn process_infos(&self) -> &[ProcessInfo] {
        &self.process_infos
    }

    pub fn set_process_info(&mut self, process_infos: Vec<ProcessInfo>) {
        self.process_infos = process_infos;
    }

    /// Add the counters of `other` process by process
    ///
    /// Processes only present in `other` are appended. Returns `false`
    /// and leaves `self` untouched if the weight strategies differ.
    pub fn merge_product(&mut self, other: &Self) -> bool {
        if self.hepidwtup != other.hepidwtup {
            return false;
        }
        for info in &other.process_infos {
            match self
                .process_infos
                .iter_mut()
                .find(|mine| mine.process == info.process)
            {
                Some(mine) => mine.merge(info),
                None => self.process_infos.push(info.clone()),
            }
        }
        true
    }
}
