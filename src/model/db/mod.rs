//! DB-compatible (e.g. de/serialisable) types.
//!
//! Every entity follows the same shape: an `XCore` with the stored fields,
//! and an `X` wrapper adding the numeric `_id`, flattened for serialisation
//! and `Deref`ing to the core.

mod background;
pub use background::{Background, BackgroundCore, NewBackground};

mod candidate;
pub use candidate::{Candidate, CandidateCore, NewCandidate};

mod party;
pub use party::{NewParty, Party, PartyCore};

mod region;
pub use region::{NewRegion, Region, RegionCore};

mod vote;
pub use vote::{Vote, VoteCore};

mod voter;
pub use voter::{NewVoter, Voter, VoterCore};
