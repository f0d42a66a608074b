mod buildings;
mod grid;
mod persist;
mod placement;
mod snapshot;
mod terrain;
mod tile;
mod trees;

pub use buildings::*;
pub use grid::*;
pub use persist::*;
pub use placement::*;
pub use snapshot::*;
pub use terrain::*;
pub use tile::*;
pub use trees::*;
