mod realsemiring;
mod semiring_traits;

pub use self::realsemiring::*;
pub use self::semiring_traits::*;
