//! Entity model for the volleyball domain.
//!
//! Static schema declarations: record structs, create/patch shapes, and
//! pure validation. The database is the source of truth; nothing in here
//! does I/O or caches rows.

pub mod competition;
pub mod media;
pub mod reference;
pub(crate) mod validate;

pub use competition::{
    Match, MatchPatch, NewMatch, NewRally, NewSeries, Rally, RallyPatch, Series, SeriesPatch, Side,
};
pub use media::{Camera, CameraPatch, NewCamera, NewVideo, Video, VideoPatch};
pub use reference::{
    JERSEY_MAX, JERSEY_MIN, Nation, NationPatch, NewNation, NewPlayer, NewTeam, Player,
    PlayerPatch, Team, TeamPatch,
};
