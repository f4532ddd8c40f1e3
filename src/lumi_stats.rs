//! Per-luminosity-block event bookkeeping
use crate::data::{FinalStat, GenLumiInfoProduct, GenRunInfoProduct, ProcessInfo};

/// Process ID under which all generated events are booked
pub const DEFAULT_PROCESS: i32 = 0;

/// Les Houches weight strategy reported when it is not known
pub const UNKNOWN_HEPIDWTUP: i32 = -1;

/// Counts the events produced in the current luminosity block
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LumiCounter {
    events: u32,
}

impl LumiCounter {
    pub fn reset(&mut self) {
        self.events = 0;
    }

    pub fn count_event(&mut self) {
        self.events += 1;
    }

    pub fn events(&self) -> u32 {
        self.events
    }

    /// Summary record for the block
    ///
    /// Every produced event passed selection, so tried, selected and
    /// killed all equal the number of events, each with unit weight.
    /// Acceptances are not computed.
    pub fn gen_lumi_info(&self, run_info: &GenRunInfoProduct) -> GenLumiInfoProduct {
        let n = self.events;
        let unit_weights = FinalStat::new(n, n as f64, n as f64);
        let info = ProcessInfo {
            process: DEFAULT_PROCESS,
            lhe_xsec: *run_info.internal_xsec(),
            n_pass_pos: n,
            n_pass_neg: 0,
            n_total_pos: n,
            n_total_neg: 0,
            tried: unit_weights,
            selected: unit_weights,
            killed: unit_weights,
            accepted: FinalStat::unknown(),
            accepted_br: FinalStat::unknown(),
        };
        GenLumiInfoProduct::new(UNKNOWN_HEPIDWTUP, vec![info])
    }
}
