/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// Win/lose jingles are generated as in-memory WAV buffers at init time.
/// The mow blip is generated per play so its pitch can follow progress.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = super::GEN_SAMPLE_RATE as u32;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_caught: Arc<Vec<u8>>,
        sfx_won: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_caught: Arc::new(make_wav(&gen_caught())),
                sfx_won: Arc::new(make_wav(&gen_won())),
            })
        }

        fn play_bytes(&self, bytes: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(bytes)) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Short blip; pitch climbs as the lawn gets mowed.
        pub fn play_mow(&self, mowed: usize, total: usize) {
            let ratio = mowed as f32 / total.max(1) as f32;
            let freq = 500.0 + ratio * 700.0;
            self.play_bytes(make_wav(&super::gen_blip(freq, 0.03, 0.15)));
        }

        pub fn play_caught(&self) { self.play_bytes(self.sfx_caught.as_ref().clone()); }
        pub fn play_won(&self) { self.play_bytes(self.sfx_won.as_ref().clone()); }
    }

    /// Caught: sad descending tone A4→F#4→Eb4→C4
    fn gen_caught() -> Vec<f32> {
        let mut samples = super::gen_notes(&[440.0, 370.0, 311.0, 261.0], 0.12, 0.3);
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            samples[i] *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    /// Won: ascending fanfare C5→E5→G5→C6 with a sustained last note
    fn gen_won() -> Vec<f32> {
        let mut samples = super::gen_notes(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3);
        samples.extend(super::gen_blip(1047.0, 0.25, 0.3));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: all produce Vec<f32> mono samples
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const GEN_SAMPLE_RATE: f32 = 22050.0;

/// Sine blip with a linear fade out.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
    let n = (GEN_SAMPLE_RATE * duration) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / GEN_SAMPLE_RATE;
            let env = 1.0 - (i as f32 / n as f32);
            (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
        })
        .collect()
}

/// Sequence of equal-length notes, each with a gentle decay.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_notes(freqs: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
    let n = (GEN_SAMPLE_RATE * note_dur) as usize;
    let mut samples = Vec::with_capacity(n * freqs.len());
    for &freq in freqs {
        for i in 0..n {
            let t = i as f32 / GEN_SAMPLE_RATE;
            let env = 1.0 - (i as f32 / n as f32) * 0.3;
            samples.push((t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume);
        }
    }
    samples
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_mow(&self, _mowed: usize, _total: usize) {}
    pub fn play_caught(&self) {}
    pub fn play_won(&self) {}
}

/// Play the effects for one frame's events.
pub fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent], mowed: usize, total: usize) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    let mut blipped = false;
    for event in events {
        match event {
            // Leaving grass and landing on grass in one frame: one blip
            GameEvent::CellMowed { .. } if !blipped => {
                sfx.play_mow(mowed, total);
                blipped = true;
            }
            GameEvent::PlayerCaught => sfx.play_caught(),
            GameEvent::PlayerWon => sfx.play_won(),
            _ => {}
        }
    }
}
