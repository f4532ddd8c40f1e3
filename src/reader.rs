use std::collections::HashMap;
use std::io::{self, BufRead};
use std::str::FromStr;

use thiserror::Error;

use crate::data::{FinalStat, GenLumiInfoProduct, GenRunInfoProduct, ProcessInfo, XSec};
use crate::tags::*;

/// One record of a summary file
#[derive(Clone, Debug, PartialEq)]
pub enum Summary {
    Lumi(GenLumiInfoProduct),
    Run(GenRunInfoProduct),
}

/// Reader for generator summary files, see [`crate::Writer`]
#[derive(Debug)]
pub struct Reader<T> {
    stream: T,
    version: &'static str,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("First line '{0}' is not a summary file opening tag")]
    BadFirstLine(String),
    #[error("Unsupported version {0}")]
    UnsupportedVersion(String),
    #[error("Version missing in opening tag")]
    MissingVersion,
    #[error("Expected a record or the closing tag, found '{0}'")]
    BadRecordStart(String),
    #[error("Bad xml tag '{0}'")]
    BadXmlTag(String),
    #[error("Missing entry '{0}'")]
    MissingEntry(String),
    #[error("Failed to convert '{value}' for entry '{name}'")]
    ConversionError { name: String, value: String },
    #[error("Expected '{expected}', found '{found}'")]
    BadLabel { expected: &'static str, found: String },
    #[error("Unexpected end of file in {0}")]
    EndOfFile(&'static str),
}

impl<T: BufRead> Reader<T> {
    /// Create a new summary reader
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let file = std::fs::File::open("summary.txt").unwrap();
    /// let file = std::io::BufReader::new(file);
    /// let reader = genfilter::Reader::new(file).unwrap();
    /// ```
    pub fn new(mut stream: T) -> Result<Reader<T>, ParseError> {
        let version = parse_version(&mut stream)?;
        Ok(Reader { stream, version })
    }

    pub fn version(&self) -> &str {
        self.version
    }

    /// Get the next record, `None` once the closing tag is reached
    pub fn summary(&mut self) -> Result<Option<Summary>, ParseError> {
        let line = read_line(&mut self.stream, "summary")?;
        let trimmed = line.trim();
        if trimmed.starts_with(LUMI_START) {
            Ok(Some(Summary::Lumi(parse_lumi(trimmed, &mut self.stream)?)))
        } else if trimmed.starts_with(RUN_START) {
            Ok(Some(Summary::Run(parse_run(&mut self.stream)?)))
        } else if trimmed == SUMMARY_LAST_LINE {
            Ok(None)
        } else {
            Err(ParseError::BadRecordStart(line))
        }
    }
}

impl<T: BufRead> Iterator for Reader<T> {
    type Item = Result<Summary, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.summary().transpose()
    }
}

fn read_line<T: BufRead>(stream: &mut T, context: &'static str) -> Result<String, ParseError> {
    let mut line = String::new();
    if stream.read_line(&mut line)? == 0 {
        return Err(ParseError::EndOfFile(context));
    }
    Ok(line)
}

fn parse_version<T: BufRead>(stream: &mut T) -> Result<&'static str, ParseError> {
    use self::ParseError::*;
    let first_line = read_line(stream, "opening tag")?;
    let mut line_entries = first_line.trim().split('"');
    if line_entries.next() != Some(SUMMARY_TAG_OPEN) {
        return Err(BadFirstLine(first_line));
    };
    let version = match line_entries.next() {
        Some("1.0") => "1.0",
        Some(version) => return Err(UnsupportedVersion(version.to_string())),
        None => return Err(MissingVersion),
    };
    if line_entries.next() != Some(">") {
        return Err(BadFirstLine(first_line));
    };
    Ok(version)
}

fn parse<T: FromStr>(name: &str, text: Option<&str>) -> Result<T, ParseError> {
    let text = text.ok_or_else(|| ParseError::MissingEntry(name.to_owned()))?;
    text.parse::<T>().map_err(|_| ParseError::ConversionError {
        name: name.to_owned(),
        value: text.to_owned(),
    })
}

fn parse_f64(name: &str, text: Option<&str>) -> Result<f64, ParseError> {
    let text = text.ok_or_else(|| ParseError::MissingEntry(name.to_owned()))?;
    fast_float::parse::<f64, _>(text).map_err(|_| ParseError::ConversionError {
        name: name.to_owned(),
        value: text.to_owned(),
    })
}

fn expect_label<'a, I>(entries: &mut I, expected: &'static str) -> Result<(), ParseError>
where
    I: Iterator<Item = &'a str>,
{
    match entries.next() {
        Some(label) if label == expected => Ok(()),
        Some(label) => Err(ParseError::BadLabel {
            expected,
            found: label.to_owned(),
        }),
        None => Err(ParseError::MissingEntry(expected.to_owned())),
    }
}

fn expect_end<T: BufRead>(stream: &mut T, end: &'static str) -> Result<(), ParseError> {
    let line = read_line(stream, end)?;
    if line.trim() != end {
        return Err(ParseError::BadLabel {
            expected: end,
            found: line.trim().to_owned(),
        });
    }
    Ok(())
}

fn extract_xml_attr(xml_tag: &str) -> Result<HashMap<&str, &str>, ParseError> {
    use self::ParseError::BadXmlTag;
    let bad_tag = || BadXmlTag(xml_tag.to_owned());
    let mut rem = xml_tag
        .strip_suffix('>')
        .ok_or_else(bad_tag)?
        .split_once(char::is_whitespace)
        .map(|(_, attr)| attr.trim_start())
        .unwrap_or("");
    let mut attr = HashMap::new();
    while !rem.is_empty() {
        let (name, value) = rem.split_once('=').ok_or_else(bad_tag)?;
        let value = value.trim_start();
        let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'');
        let quote = quote.ok_or_else(bad_tag)?;
        let (value, tail) = value[1..].split_once(quote).ok_or_else(bad_tag)?;
        attr.insert(name.trim(), value);
        rem = tail.trim_start();
    }
    Ok(attr)
}

fn parse_stat<T: BufRead>(stream: &mut T, label: &'static str) -> Result<FinalStat, ParseError> {
    let line = read_line(stream, "process")?;
    let mut entries = line.split_whitespace();
    expect_label(&mut entries, label)?;
    Ok(FinalStat {
        n: parse(label, entries.next())?,
        sum: parse_f64(label, entries.next())?,
        sum2: parse_f64(label, entries.next())?,
    })
}

fn parse_process<T: BufRead>(stream: &mut T) -> Result<ProcessInfo, ParseError> {
    let line = read_line(stream, "process")?;
    let mut entries = line.split_whitespace();
    let process = parse("process", entries.next())?;
    let n_pass_pos = parse("n_pass_pos", entries.next())?;
    let n_pass_neg = parse("n_pass_neg", entries.next())?;
    let n_total_pos = parse("n_total_pos", entries.next())?;
    let n_total_neg = parse("n_total_neg", entries.next())?;
    let lhe_xsec = XSec::new(
        parse_f64("lhe_xsec", entries.next())?,
        parse_f64("lhe_xsec_error", entries.next())?,
    );
    let mut stats = [FinalStat::default(); 5];
    for (stat, label) in stats.iter_mut().zip(STAT_LABELS) {
        *stat = parse_stat(stream, label)?;
    }
    let [tried, selected, killed, accepted, accepted_br] = stats;
    Ok(ProcessInfo {
        process,
        lhe_xsec,
        n_pass_pos,
        n_pass_neg,
        n_total_pos,
        n_total_neg,
        tried,
        selected,
        killed,
        accepted,
        accepted_br,
    })
}

fn parse_lumi<T: BufRead>(lumi_open: &str, stream: &mut T) -> Result<GenLumiInfoProduct, ParseError> {
    let attr = extract_xml_attr(lumi_open)?;
    let hepidwtup = parse(HEPIDWTUP_ATTR, attr.get(HEPIDWTUP_ATTR).copied())?;
    let nprocesses: usize = parse(PROCESSES_ATTR, attr.get(PROCESSES_ATTR).copied())?;
    let mut process_infos = Vec::with_capacity(nprocesses);
    for _ in 0..nprocesses {
        process_infos.push(parse_process(stream)?);
    }
    expect_end(stream, LUMI_END)?;
    Ok(GenLumiInfoProduct::new(hepidwtup, process_infos))
}

fn parse_run<T: BufRead>(stream: &mut T) -> Result<GenRunInfoProduct, ParseError> {
    let mut xsecs = [XSec::default(); 3];
    for (xsec, label) in xsecs.iter_mut().zip(XSEC_LABELS) {
        let line = read_line(stream, "run")?;
        let mut entries = line.split_whitespace();
        expect_label(&mut entries, label)?;
        *xsec = XSec::new(
            parse_f64(label, entries.next())?,
            parse_f64(label, entries.next())?,
        );
    }
    let line = read_line(stream, "run")?;
    let mut entries = line.split_whitespace();
    expect_label(&mut entries, FILTER_EFFICIENCY)?;
    let efficiency = parse_f64(FILTER_EFFICIENCY, entries.next())?;
    expect_end(stream, RUN_END)?;

    let [internal, lo, nlo] = xsecs;
    let mut run = GenRunInfoProduct::default();
    run.set_internal_xsec(internal);
    run.set_external_xsec_lo(lo);
    run.set_external_xsec_nlo(nlo);
    run.set_filter_efficiency(efficiency);
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_attributes() {
        let attr = extract_xml_attr("<lumi hepidwtup=\"3\"  processes='2'>").unwrap();
        assert_eq!(attr.get("hepidwtup"), Some(&"3"));
        assert_eq!(attr.get("processes"), Some(&"2"));
        assert!(extract_xml_attr("<lumi>").unwrap().is_empty());
        assert!(extract_xml_attr("<lumi hepidwtup=3>").is_err());
        assert!(extract_xml_attr("<lumi hepidwtup=\"3\"").is_err());
    }

    #[test]
    fn read() {
        let input = "\
<GenSummary version=\"1.0\">
<run>
internal 51.2 0.3
external_lo -1.0 -1.0
external_nlo 60 1e-1
filter_efficiency 0.25
</run>
</GenSummary>
";
        let mut reader = Reader::new(io::Cursor::new(input)).unwrap();
        assert_eq!(reader.version(), "1.0");
        let run = match reader.summary().unwrap() {
            Some(Summary::Run(run)) => run,
            other => panic!("expected run summary, got {:?}", other),
        };
        assert_eq!(run.internal_xsec(), &XSec::new(51.2, 0.3));
        assert!(!run.external_xsec_lo().is_set());
        assert_eq!(run.external_xsec_nlo(), &XSec::new(60., 0.1));
        assert_eq!(run.filter_efficiency(), 0.25);
        assert!(reader.summary().unwrap().is_none());
    }

    #[test]
    fn malformed_input() {
        let err = Reader::new(io::Cursor::new("<LesHouchesEvents version=\"1.0\">\n")).unwrap_err();
        assert!(matches!(err, ParseError::BadFirstLine(_)));
        let err = Reader::new(io::Cursor::new("<GenSummary version=\"2.0\">\n")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(_)));

        let input = "<GenSummary version=\"1.0\">\n<run>\ninternal x 0.3\n";
        let mut reader = Reader::new(io::Cursor::new(input)).unwrap();
        assert!(matches!(
            reader.summary(),
            Err(ParseError::ConversionError { .. })
        ));

        let input = "<GenSummary version=\"1.0\">\n<run>\nexternal_lo 1 1\n";
        let mut reader = Reader::new(io::Cursor::new(input)).unwrap();
        assert!(matches!(reader.summary(), Err(ParseError::BadLabel { .. })));

        let mut reader = Reader::new(io::Cursor::new("<GenSummary version=\"1.0\">\n")).unwrap();
        assert!(matches!(reader.summary(), Err(ParseError::EndOfFile(_))));
    }
}
