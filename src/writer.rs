use std::fmt;
use std::io::{self, Write};

use itertools::izip;
use thiserror::Error;

use crate::data::{FinalStat, GenLumiInfoProduct, GenRunInfoProduct, XSec};
use crate::tags::*;

/// Writer for generator summary files
///
/// A summary file holds the luminosity block and run records published
/// by the filter, one tagged block per record.
///
/// # Example
///
/// ```rust
/// use genfilter::{GenRunInfoProduct, Writer, XSec};
///
/// let mut run_info = GenRunInfoProduct::default();
/// run_info.set_internal_xsec(XSec::new(51.2, 0.3));
/// let mut writer = Writer::new(Vec::new(), "1.0").unwrap();
/// writer.write_run(&run_info).unwrap();
/// let output = writer.finish().unwrap();
/// assert!(output.starts_with(b"<GenSummary"));
/// ```
#[derive(Debug)]
pub struct Writer<Stream: Write> {
    stream: Stream,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error")]
    Io(#[from] io::Error),
}

impl<Stream: Write> Writer<Stream> {
    pub fn new(mut stream: Stream, version: &str) -> Result<Writer<Stream>, WriteError> {
        let output = [SUMMARY_TAG_OPEN, "\"", version, "\">\n"];
        for text in &output {
            stream.write_all(text.as_bytes())?;
        }
        Ok(Writer { stream })
    }

    fn write<T: fmt::Display + ?Sized>(&mut self, expr: &T) -> Result<(), io::Error> {
        write!(self.stream, "{}", expr)
    }

    fn write_field<T: fmt::Display + ?Sized>(&mut self, expr: &T) -> Result<(), io::Error> {
        write!(self.stream, "{} ", expr)
    }

    // shortest representation that parses back to the same value
    fn write_float(&mut self, x: f64) -> Result<(), io::Error> {
        let mut buffer = ryu::Buffer::new();
        self.stream.write_all(buffer.format(x).as_bytes())
    }

    fn write_xsec(&mut self, label: &str, xsec: &XSec) -> Result<(), io::Error> {
        self.write_field(label)?;
        self.write_float(xsec.value())?;
        self.write(" ")?;
        self.write_float(xsec.error())?;
        self.write("\n")
    }

    fn write_stat(&mut self, label: &str, stat: &FinalStat) -> Result<(), io::Error> {
        self.write_field(label)?;
        self.write_field(&stat.n)?;
        self.write_float(stat.sum)?;
        self.write(" ")?;
        self.write_float(stat.sum2)?;
        self.write("\n")
    }

    /// Write the closing tag and hand back the underlying stream
    pub fn finish(mut self) -> Result<Stream, WriteError> {
        self.write(SUMMARY_LAST_LINE)?;
        self.write("\n")?;
        self.stream.flush()?;
        Ok(self.stream)
    }

    pub fn write_lumi(&mut self, lumi: &GenLumiInfoProduct) -> Result<(), WriteError> {
        let infos = lumi.process_infos();
        writeln!(
            self.stream,
            "{} {}=\"{}\" {}=\"{}\">",
            LUMI_START,
            HEPIDWTUP_ATTR,
            lumi.hepidwtup(),
            PROCESSES_ATTR,
            infos.len()
        )?;
        for info in infos {
            self.write_field(&info.process)?;
            self.write_field(&info.n_pass_pos)?;
            self.write_field(&info.n_pass_neg)?;
            self.write_field(&info.n_total_pos)?;
            self.write_field(&info.n_total_neg)?;
            self.write_float(info.lhe_xsec.value())?;
            self.write(" ")?;
            self.write_float(info.lhe_xsec.error())?;
            self.write("\n")?;
            let stats = [
                &info.tried,
                &info.selected,
                &info.killed,
                &info.accepted,
                &info.accepted_br,
            ];
            for (label, stat) in izip!(STAT_LABELS, stats) {
                self.write_stat(label, stat)?;
            }
        }
        self.write(LUMI_END)?;
        self.write("\n")?;
        Ok(())
    }

    pub fn write_run(&mut self, run: &GenRunInfoProduct) -> Result<(), WriteError> {
        self.write(RUN_START)?;
        self.write(">\n")?;
        let xsecs = [
            run.internal_xsec(),
            run.external_xsec_lo(),
            run.external_xsec_nlo(),
        ];
        for (label, xsec) in izip!(XSEC_LABELS, xsecs) {
            self.write_xsec(label, xsec)?;
        }
        self.write_field(FILTER_EFFICIENCY)?;
        self.write_float(run.filter_efficiency())?;
        self.write("\n")?;
        self.write(RUN_END)?;
        self.write("\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProcessInfo;

    #[test]
    fn write() {
        let stat = FinalStat::new(3, 3., 3.);
        let lumi = GenLumiInfoProduct::new(
            -1,
            vec![ProcessInfo {
                process: 0,
                lhe_xsec: XSec::new(120588124.02, 702517.48228),
                n_pass_pos: 3,
                n_total_pos: 3,
                tried: stat,
                selected: stat,
                killed: stat,
                accepted: FinalStat::unknown(),
                accepted_br: FinalStat::unknown(),
                ..Default::default()
            }],
        );
        let mut writer = Writer::new(Vec::new(), "1.0").unwrap();
        writer.write_lumi(&lumi).unwrap();
        writer.write_run(&GenRunInfoProduct::default()).unwrap();
        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        let expected = "\
<GenSummary version=\"1.0\">
<lumi hepidwtup=\"-1\" processes=\"1\">
0 3 0 3 0 120588124.02 702517.48228
tried 3 3.0 3.0
selected 3 3.0 3.0
killed 3 3.0 3.0
accepted 0 -1.0 -1.0
accepted_br 0 -1.0 -1.0
</lumi>
<run>
internal -1.0 -1.0
external_lo -1.0 -1.0
external_nlo -1.0 -1.0
filter_efficiency -1.0
</run>
</GenSummary>
";
        assert_eq!(output, expected);
    }
}
