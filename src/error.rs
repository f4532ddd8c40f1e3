use std::fmt;

use thiserror::Error;

use crate::pset::ParameterError;
use crate::random::EngineError;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
///
/// Every error returned by the lifecycle entry points stops the job; the
/// kind tells the caller whether the configuration or the calling
/// sequence was at fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    LogicError,
    NotFound,
}

/// Configuration step that a backend refused
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationStep {
    ReadSettings,
    DeclareStableParticles,
    DeclareSpecialSettings,
    InitializeForInternalPartons,
}

impl fmt::Display for ConfigurationStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ConfigurationStep::*;
        let text = match *self {
            ReadSettings => "read settings",
            DeclareStableParticles => "declare stable particles",
            DeclareSpecialSettings => "declare special settings",
            InitializeForInternalPartons => {
                "initialize for internal parton generation"
            }
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to {step} (hadronizer {backend})")]
    Configuration {
        backend: String,
        step: ConfigurationStep,
    },
    #[error("decayer {backend} rejected its setup: {reason}")]
    DecayerSetup { backend: String, reason: String },
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    RandomEngine(#[from] EngineError),
    #[error("no {kind} backend registered under the name '{name}'")]
    UnknownBackend { kind: &'static str, name: String },
    #[error("product {product} was already put into the {principal}")]
    ProductAlreadyPut {
        product: &'static str,
        principal: &'static str,
    },
    #[error("{transition} called while {state}")]
    Transition {
        transition: &'static str,
        state: &'static str,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use self::Error::*;
        match self {
            Configuration { .. } | DecayerSetup { .. } | Parameter(_) => {
                ErrorKind::Configuration
            }
            UnknownBackend { .. } => ErrorKind::NotFound,
            RandomEngine(_) | ProductAlreadyPut { .. } | Transition { .. } => {
                ErrorKind::LogicError
            }
        }
    }

    pub(crate) fn configuration(
        backend: &str,
        step: ConfigurationStep,
    ) -> Self {
        Error::Configuration {
            backend: backend.to_owned(),
            step,
        }
    }
}
