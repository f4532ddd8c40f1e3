use crate::status;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One generated event as a particle/vertex graph
///
/// Particles and vertices refer to each other by their index in
/// `particles` and `vertices`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenEvent {
    /// Framework event number, stamped once the event is final
    pub event_number: u64,
    /// ID of the hard process
    pub signal_process_id: i32,
    /// Scale of the hard process in GeV
    pub event_scale: f64,
    /// Value of the QCD coupling α_s
    pub alpha_qcd: f64,
    /// Value of the QED coupling α
    pub alpha_qed: f64,
    /// Event weights, the first one is the nominal weight
    pub weights: Vec<f64>,
    pub particles: Vec<GenParticle>,
    pub vertices: Vec<GenVertex>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenParticle {
    /// PDG particle ID
    pub pdg_id: i32,
    /// HepMC status, see [`crate::status`]
    pub status: i32,
    /// Four-momentum (px, py, pz, E) in GeV
    pub momentum: [f64; 4],
    /// Generated mass in GeV
    pub generated_mass: f64,
    pub production_vertex: Option<usize>,
    pub end_vertex: Option<usize>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenVertex {
    /// Position (x, y, z, ct) in mm
    pub position: [f64; 4],
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
}

impl GenParticle {
    pub fn new(pdg_id: i32, status: i32, momentum: [f64; 4], generated_mass: f64) -> Self {
        GenParticle {
            pdg_id,
            status,
            momentum,
            generated_mass,
            production_vertex: None,
            end_vertex: None,
        }
    }

    /// Transverse momentum
    pub fn pt(&self) -> f64 {
        self.momentum[0].hypot(self.momentum[1])
    }

    pub fn is_final_state(&self) -> bool {
        self.status == status::FINAL_STATE
    }
}

impl GenEvent {
    pub fn new(signal_process_id: i32) -> Self {
        GenEvent {
            signal_process_id,
            ..Default::default()
        }
    }

    pub fn set_event_number(&mut self, event_number: u64) {
        self.event_number = event_number;
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn add_vertex(&mut self, position: [f64; 4]) -> usize {
        self.vertices.push(GenVertex {
            position,
            ..Default::default()
        });
        self.vertices.len() - 1
    }

    /// Add a particle, attaching it to its production vertex if it has one
    pub fn add_particle(&mut self, particle: GenParticle) -> usize {
        let idx = self.particles.len();
        if let Some(vertex) = particle.production_vertex {
            self.vertices[vertex].outgoing.push(idx);
        }
        if let Some(vertex) = particle.end_vertex {
            self.vertices[vertex].incoming.push(idx);
        }
        self.particles.push(particle);
        idx
    }

    /// Mark particle `idx` as decayed into `products`
    ///
    /// The products are attached to a new vertex at `position`. Returns
    /// the index of that vertex.
    pub fn decay_particle<I>(&mut self, idx: usize, products: I, position: [f64; 4]) -> usize
    where
        I: IntoIterator<Item = GenParticle>,
    {
        let vertex = self.add_vertex(position);
        self.vertices[vertex].incoming.push(idx);
        let parent = &mut self.particles[idx];
        parent.status = status::DECAYED;
        parent.end_vertex = Some(vertex);
        for mut product in products {
            product.production_vertex = Some(vertex);
            product.end_vertex = None;
            self.add_particle(product);
        }
        vertex
    }

    /// Indices of all particles in the final state
    pub fn final_state(&self) -> impl Iterator<Item = usize> + '_ {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_final_state())
            .map(|(idx, _)| idx)
    }

    /// Scalar sum of the final-state transverse momenta
    pub fn ht(&self) -> f64 {
        self.final_state().map(|idx| self.particles[idx].pt()).sum()
    }
}
