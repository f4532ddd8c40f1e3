use std::collections::HashMap;

use crate::decayer::Decayer;
use crate::error::{Error, Result};
use crate::hadronizer::Hadronizer;
use crate::pset::ParameterSet;
use crate::toy::{ToyDecayer, ToyHadronizer};

pub type HadronizerMaker = fn(&ParameterSet) -> Result<Box<dyn Hadronizer>>;
pub type DecayerMaker = fn(&ParameterSet) -> Result<Box<dyn Decayer>>;

/// Backends that can be chosen by name in the configuration
///
/// The hadronizer is selected by the `hadronizer` parameter of the
/// generator block, the decayer by the `decayer` parameter of its
/// `ExternalDecays` block.
#[derive(Clone, Debug, Default)]
pub struct Plugins {
    hadronizers: HashMap<String, HadronizerMaker>,
    decayers: HashMap<String, DecayerMaker>,
}

impl Plugins {
    /// Registry without any backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the backends shipped in this crate
    pub fn builtin() -> Self {
        let mut plugins = Self::new();
        plugins.register_hadronizer("toy", |pset| Ok(Box::new(ToyHadronizer::new(pset)?)));
        plugins.register_decayer("toy", |pset| Ok(Box::new(ToyDecayer::new(pset)?)));
        plugins
    }

    pub fn register_hadronizer(&mut self, name: &str, maker: HadronizerMaker) {
        self.hadronizers.insert(name.to_owned(), maker);
    }

    pub fn register_decayer(&mut self, name: &str, maker: DecayerMaker) {
        self.decayers.insert(name.to_owned(), maker);
    }

    pub fn make_hadronizer(&self, pset: &ParameterSet) -> Result<Box<dyn Hadronizer>> {
        let name: String = pset.get_parameter("hadronizer")?;
        let maker = self.hadronizers.get(&name).ok_or(Error::UnknownBackend {
            kind: "hadronizer",
            name,
        })?;
        maker(pset)
    }

    pub fn make_decayer(&self, pset: &ParameterSet) -> Result<Box<dyn Decayer>> {
        let name: String = pset.get_parameter("decayer")?;
        let maker = self.decayers.get(&name).ok_or(Error::UnknownBackend {
            kind: "decayer",
            name,
        })?;
        maker(pset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn lookup_by_name() {
        let plugins = Plugins::builtin();
        let pset = ParameterSet::new("generator").with_parameter("hadronizer", "toy");
        assert_eq!(plugins.make_hadronizer(&pset).unwrap().classname(), "ToyHadronizer");

        let pset = ParameterSet::new("generator").with_parameter("hadronizer", "herwig");
        let err = plugins.make_hadronizer(&pset).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let decays = ParameterSet::new("ExternalDecays").with_parameter("decayer", "toy");
        assert_eq!(plugins.make_decayer(&decays).unwrap().classname(), "ToyDecayer");
        let err = Plugins::new().make_decayer(&decays).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = plugins.make_decayer(&ParameterSet::new("ExternalDecays")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
