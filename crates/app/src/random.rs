//! Default [`ChoiceSource`] backed by the thread-local RNG.

use rand::Rng;

use crate::ports::ChoiceSource;

/// Uniform random choice using [`rand::thread_rng`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChoice;

impl ChoiceSource for RandomChoice {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}
