//! Physical layer components: collaborator seams and timing policy
//! (`transport`), and the arbitration/framing state machine (`physical`).
pub mod physical;
pub mod transport;
