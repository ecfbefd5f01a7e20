//! Best-wave tracking across sessions.

use tracing::info;

/// Persistent storage for the highest wave ever reached.
pub trait BestWaveStore {
    /// Error raised by the backing storage.
    type Error;

    /// Loads the stored best wave, or `None` when nothing was recorded yet.
    fn load_best_wave(&mut self) -> Result<Option<u32>, Self::Error>;

    /// Replaces the stored best wave.
    fn save_best_wave(&mut self, wave: u32) -> Result<(), Self::Error>;
}

/// Outcome of recording a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BestWave {
    /// Best wave after recording the session.
    pub wave: u32,
    /// Whether the session set a new record.
    pub new_record: bool,
}

/// Reports whether `final_wave` beats the `previous` record.
#[must_use]
pub fn is_new_best(final_wave: u32, previous: Option<u32>) -> bool {
    previous.map_or(true, |best| final_wave > best)
}

/// Compares a finished session against the stored record and saves it when beaten.
pub fn record_session<S>(store: &mut S, final_wave: u32) -> Result<BestWave, S::Error>
where
    S: BestWaveStore,
{
    let previous = store.load_best_wave()?;
    if !is_new_best(final_wave, previous) {
        return Ok(BestWave {
            wave: previous.unwrap_or(final_wave),
            new_record: false,
        });
    }

    store.save_best_wave(final_wave)?;
    info!(wave = final_wave, ?previous, "new best wave");
    Ok(BestWave {
        wave: final_wave,
        new_record: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Default)]
    struct MemoryStore {
        best: Option<u32>,
        saves: usize,
    }

    impl BestWaveStore for MemoryStore {
        type Error = Infallible;

        fn load_best_wave(&mut self) -> Result<Option<u32>, Self::Error> {
            Ok(self.best)
        }

        fn save_best_wave(&mut self, wave: u32) -> Result<(), Self::Error> {
            self.best = Some(wave);
            self.saves += 1;
            Ok(())
        }
    }

    #[test]
    fn first_session_is_always_a_record() {
        assert!(is_new_best(1, None));
        assert!(is_new_best(4, Some(3)));
        assert!(!is_new_best(3, Some(3)));
    }

    #[test]
    fn record_saves_only_improvements() {
        let mut store = MemoryStore::default();

        let first = record_session(&mut store, 4).expect("infallible");
        assert_eq!(
            first,
            BestWave {
                wave: 4,
                new_record: true
            }
        );

        let second = record_session(&mut store, 2).expect("infallible");
        assert_eq!(
            second,
            BestWave {
                wave: 4,
                new_record: false
            }
        );
        assert_eq!(store.saves, 1);
    }
}
