use std::io::BufReader;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use genfilter::{
    Event, EventID, EventSetup, GeneratorFilter, LuminosityBlock, LuminosityBlockIndex,
    ParameterSet, Plugins, RandomNumberGenerator, Reader, StreamID, Writer,
};

fn criterion_benchmark(c: &mut Criterion) {
    let config: ParameterSet = r#"
<generator hadronizer="toy" multiplicity="50" ptMin="15">
  <ExternalDecays decayer="toy"/>
</generator>"#
        .parse()
        .unwrap();
    let engines = Arc::new(RandomNumberGenerator::new(1));
    let mut filter = GeneratorFilter::from_pset(&config, &Plugins::builtin(), engines).unwrap();
    let mut lumi = LuminosityBlock::new(1, 1, LuminosityBlockIndex(0));
    filter
        .begin_luminosity_block_produce(&mut lumi, &EventSetup::default())
        .unwrap();
    let mut nevent = 0;
    c.bench_function("filter", |b| {
        b.iter(|| {
            nevent += 1;
            let mut event = Event::new(EventID::new(1, 1, nevent), StreamID(0));
            assert!(filter.filter(&mut event).unwrap());
        })
    });
    filter.end_luminosity_block(&lumi);
    filter.end_luminosity_block_produce(&mut lumi).unwrap();

    let lumi_info = lumi.gen_lumi_info().unwrap();
    let mut summary = Writer::new(Vec::new(), "1.0").unwrap();
    for _ in 0..1000 {
        summary.write_lumi(lumi_info).unwrap();
    }
    let summary = summary.finish().unwrap();

    c.bench_function("write", |b| {
        b.iter(|| {
            let mut writer = Writer::new(std::io::sink(), "1.0").unwrap();
            for _ in 0..1000 {
                writer.write_lumi(lumi_info).unwrap();
            }
            writer.finish().unwrap();
        })
    });

    c.bench_function("read", |b| {
        b.iter(|| {
            let reader = Reader::new(BufReader::new(summary.as_slice())).unwrap();
            let mut nrecords = 0;
            for record in reader {
                record.unwrap();
                nrecords += 1;
            }
            assert_eq!(nrecords, 1000);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
