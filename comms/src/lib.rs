//! Wire types shared between the round coordinator and its participants.
//!
//! Every type in this crate is plain data: the JSON shapes of the HTTP surface
//! (see [`msg`]) and the serialisable configuration of a coordinator
//! (see [`specs`]).

pub mod msg;
pub mod specs;

pub use msg::{
    GlobalModelResponse, Metadata, Rejection, RejectionKind, Retry, RoundState,
    RoundStatusResponse, Status, SubmitResponse, UpdatePacket, UpdatesCountResponse,
};
