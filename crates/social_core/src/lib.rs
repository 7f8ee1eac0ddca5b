pub mod domain;
pub mod ports;
pub mod validation;

pub use domain::{
    NewReaction, NewThought, NewUser, Reaction, Thought, ThoughtChanges, User, UserChanges,
    UserProfile,
};
pub use ports::{DatabaseService, PortError, PortResult};
