/// Undecayed physical particle, present in the final state
pub const FINAL_STATE: i32 = 1;
/// Decayed physical particle
pub const DECAYED: i32 = 2;
/// Documentation line, not part of the physical event record
pub const DOCUMENTATION: i32 = 3;
/// Incoming beam particle
pub const BEAM: i32 = 4;
/// Parton from the hard process, before hadronization
pub const HARD_PROCESS: i32 = 23;
/// Parton that was turned into hadrons
pub const HADRONIZED: i32 = 71;
