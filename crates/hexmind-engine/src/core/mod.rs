pub use self::hex::{CubeCoord, Facing, FractionalCube, HexCoord};

pub mod hex;
