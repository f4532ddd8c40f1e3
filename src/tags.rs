pub(crate) const SUMMARY_TAG_OPEN: &str = "<GenSummary version=";
pub(crate) const SUMMARY_LAST_LINE: &str = "</GenSummary>";
pub(crate) const LUMI_START: &str = "<lumi";
pub(crate) const LUMI_END: &str = "</lumi>";
pub(crate) const RUN_START: &str = "<run";
pub(crate) const RUN_END: &str = "</run>";

pub(crate) const STAT_LABELS: [&str; 5] = ["tried", "selected", "killed", "accepted", "accepted_br"];
pub(crate) const XSEC_LABELS: [&str; 3] = ["internal", "external_lo", "external_nlo"];
pub(crate) const FILTER_EFFICIENCY: &str = "filter_efficiency";

pub(crate) const HEPIDWTUP_ATTR: &str = "hepidwtup";
pub(crate) const PROCESSES_ATTR: &str = "processes";
