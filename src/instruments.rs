//! The fixed instrument bank: a statically enumerated set of named WAV
//! samples used for note and drum playback, loaded once at project start.
//!
//! Loading is fire-and-forget from the loader's point of view: playback may
//! begin before the bank finishes, and callers poll [`InstrumentTable::loaded`]
//! or await the returned future for a barrier. Each instrument writes a
//! disjoint table slot, so concurrent decodes never contend on data.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use tracing::{debug, warn};

use crate::{
    config::LoaderConfig,
    error::{StageError, StageResult},
    fetch::Fetch,
    sound::decode_instrument,
};

/// Instrument name to soundbank filename, one fixed entry per instrument.
pub const INSTRUMENT_BANK: &[(&str, &str)] = &[
    ("AcousticPiano", "AcousticPiano_As3_22k.wav"),
    ("ElectricPiano", "ElectricPiano_C2_22k.wav"),
    ("Organ", "Organ_G2_22k.wav"),
    ("AcousticGuitar", "AcousticGuitar_F3_22k.wav"),
    ("ElectricGuitar", "ElectricGuitar_F3_22k.wav"),
    ("Bass", "Bass_D2_22k.wav"),
    ("Pizzicato", "Pizz_G2_22k.wav"),
    ("Cello", "Cello_C2_22k.wav"),
    ("Trombone", "Trombone_B3_22k.wav"),
    ("Clarinet", "Clarinet_C4_22k.wav"),
    ("Saxophone", "Sax_C3_22k.wav"),
    ("Flute", "Flute_B4_22k.wav"),
    ("WoodenFlute", "WoodenFlute_C4_22k.wav"),
    ("Bassoon", "Bassoon_C3_22k.wav"),
    ("Choir", "Choir_F3_22k.wav"),
    ("Vibraphone", "Vibraphone_C3_22k.wav"),
    ("MusicBox", "MusicBox_C4_22k.wav"),
    ("SteelDrum", "SteelDrum_D5_22k.wav"),
    ("Marimba", "Marimba_C4_22k.wav"),
    ("SynthLead", "SynthLead_C4_22k.wav"),
    ("SynthPad", "SynthPad_C4_22k.wav"),
    ("SnareDrum", "SnareDrum_22k.wav"),
    ("BassDrum", "BassDrum_22k.wav"),
    ("HandClap", "Clap_22k.wav"),
    ("Tambourine", "Tambourine_22k.wav"),
];

/// Write-once-then-read-only mapping from instrument name to its decoded
/// 16-bit sample window, plus a monotonic loaded counter.
///
/// Owned by the loader session behind an [`Arc`]; there is no process global.
#[derive(Debug, Default)]
pub struct InstrumentTable {
    samples: RwLock<HashMap<&'static str, Arc<Vec<i16>>>>,
    loaded: AtomicUsize,
}

impl InstrumentTable {
    /// Empty table; slots fill as instrument decodes complete.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instruments in the static bank.
    pub fn bank_size() -> usize {
        INSTRUMENT_BANK.len()
    }

    /// Instruments decoded so far. Monotonic; advisory only.
    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::Acquire)
    }

    /// Decoded sample window for `name`, if that instrument has landed.
    pub fn get(&self, name: &str) -> Option<Arc<Vec<i16>>> {
        let map = self.samples.read().unwrap_or_else(|e| e.into_inner());
        map.get(name).cloned()
    }

    /// Store a decoded window. First write wins; the counter moves exactly
    /// once per name.
    fn install(&self, name: &'static str, window: Vec<i16>) -> bool {
        let mut map = self.samples.write().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(name) {
            return false;
        }
        map.insert(name, Arc::new(window));
        drop(map);
        self.loaded.fetch_add(1, Ordering::Release);
        true
    }

    /// Fetch and decode every instrument in the bank, concurrently and
    /// independently. Every failure is collected and reported; successful
    /// slots stay installed regardless.
    pub async fn load_all(
        self: &Arc<Self>,
        fetch: Arc<dyn Fetch>,
        config: Arc<LoaderConfig>,
    ) -> StageResult<()> {
        let tasks = INSTRUMENT_BANK.iter().map(|(name, file)| {
            let fetch = Arc::clone(&fetch);
            let config = Arc::clone(&config);
            let table = Arc::clone(self);
            async move {
                let url = config.soundbank_url(file);
                let bytes = fetch.fetch_bytes(&url).await?;
                let window = decode_instrument(&bytes)?;
                debug!(instrument = name, samples = window.len(), "instrument decoded");
                table.install(name, window);
                Ok::<(), StageError>(())
            }
        });

        let mut failures = Vec::new();
        for ((name, _), result) in INSTRUMENT_BANK
            .iter()
            .zip(futures::future::join_all(tasks).await)
        {
            if let Err(e) = result {
                warn!(instrument = name, error = %e, "instrument failed to load");
                failures.push(format!("{name}: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StageError::AssetsFailed { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    struct BankFetch {
        config: Arc<LoaderConfig>,
    }

    #[async_trait::async_trait]
    impl Fetch for BankFetch {
        async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>> {
            // Serve a window whose length equals the instrument's position in
            // the bank plus one, so cross-slot corruption would be visible.
            for (i, (_, file)) in INSTRUMENT_BANK.iter().enumerate() {
                if url == self.config.soundbank_url(file) {
                    let samples: Vec<i16> = (0..=i as i16).collect();
                    return Ok(wav_bytes(&samples));
                }
            }
            Err(StageError::transport(url, "unexpected url"))
        }
    }

    #[test]
    fn install_is_write_once() {
        let table = InstrumentTable::new();
        assert!(table.install("AcousticPiano", vec![1, 2, 3]));
        assert!(!table.install("AcousticPiano", vec![9, 9, 9]));
        assert_eq!(table.loaded(), 1);
        assert_eq!(table.get("AcousticPiano").unwrap().as_slice(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn load_all_populates_every_slot_without_corruption() {
        let config = Arc::new(LoaderConfig::default());
        let table = Arc::new(InstrumentTable::new());
        table
            .load_all(
                Arc::new(BankFetch {
                    config: Arc::clone(&config),
                }),
                Arc::clone(&config),
            )
            .await
            .unwrap();

        assert_eq!(table.loaded(), InstrumentTable::bank_size());
        for (i, (name, _)) in INSTRUMENT_BANK.iter().enumerate() {
            let window = table.get(name).unwrap();
            assert_eq!(window.len(), i + 1, "window size for {name}");
        }
    }

    #[tokio::test]
    async fn load_all_reports_every_failure() {
        struct NoBank;

        #[async_trait::async_trait]
        impl Fetch for NoBank {
            async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>> {
                Err(StageError::transport(url, "offline"))
            }
        }

        let table = Arc::new(InstrumentTable::new());
        let err = table
            .load_all(Arc::new(NoBank), Arc::new(LoaderConfig::default()))
            .await
            .unwrap_err();
        let StageError::AssetsFailed { failures } = err else {
            panic!("expected aggregated failure");
        };
        assert_eq!(failures.len(), InstrumentTable::bank_size());
        assert_eq!(table.loaded(), 0);
    }
}
