use crate::resample::resample_mono_f32;
use anyhow::Context;

/// The transcription endpoint takes 16 kHz mono PCM16 WAV.
pub const UPLOAD_SAMPLE_RATE_HZ: u32 = 16_000;
pub const UPLOAD_MIME_TYPE: &str = "audio/wav";

pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

/// Encode a finished capture as a WAV payload ready for upload, resampling
/// from the device rate when needed.
pub fn encode_wav_16k(captured: &CapturedAudio) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(!captured.samples.is_empty(), "no samples to encode");

    let samples: Vec<f32> = if captured.sample_rate_hz == UPLOAD_SAMPLE_RATE_HZ {
        captured.samples.clone()
    } else {
        resample_mono_f32(
            &captured.samples,
            captured.sample_rate_hz,
            UPLOAD_SAMPLE_RATE_HZ,
        )?
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: UPLOAD_SAMPLE_RATE_HZ,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).context("create WAV writer")?;
        for &s in &samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(v).context("write WAV sample")?;
        }
        writer.finalize().context("finalize WAV")?;
    }

    Ok(cursor.into_inner())
}
